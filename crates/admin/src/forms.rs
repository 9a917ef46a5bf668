//! Admin submission forms and their validation rules.
//!
//! Product and category submissions arrive as multipart bodies whose field
//! names follow the backend's spelling, so the management UI posts the same
//! shape either place. Store submissions arrive as JSON. Everything is
//! parsed and validated here before a backend write is attempted; the
//! messages are the Spanish strings the management UI shows verbatim.
//!
//! Validation failures come back keyed by the snake_case form field, with
//! cross-field schedule failures under `__all__`.

use axum::extract::Multipart;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use mercadito_core::{CategoryId, StoreId};

use crate::backend::{CategoryInput, ImageUpload, ProductInput, StoreInput};
use crate::error::AdminError;

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Content types the image pipeline accepts.
const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

const REQUIRED_MESSAGE: &str = "Por favor, completa todos los campos obligatorios";

// =============================================================================
// Product Form
// =============================================================================

/// A product form parsed from a multipart submission.
#[derive(Debug, Default, Validate)]
pub struct ProductForm {
    #[validate(custom(
        function = "required_trimmed",
        message = "Por favor, completa todos los campos obligatorios"
    ))]
    pub name: String,
    pub description: String,
    #[validate(
        required(message = "Por favor, completa todos los campos obligatorios"),
        custom(function = "non_negative", message = "El precio no puede ser negativo.")
    )]
    pub price: Option<Decimal>,
    #[validate(required(message = "Por favor, completa todos los campos obligatorios"))]
    pub stock: Option<u32>,
    #[validate(required(message = "Por favor, completa todos los campos obligatorios"))]
    pub category_id: Option<CategoryId>,
    #[validate(required(message = "Por favor, completa todos los campos obligatorios"))]
    pub store_id: Option<StoreId>,
    pub active: bool,
}

impl ProductForm {
    /// Validate and convert into the backend write shape.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation failures.
    pub fn into_input(self) -> Result<ProductInput, ValidationErrors> {
        self.validate()?;

        let price = self.price.ok_or_else(|| required_errors("price"))?;
        let stock = self.stock.ok_or_else(|| required_errors("stock"))?;
        let category_id = self.category_id.ok_or_else(|| required_errors("category_id"))?;
        let store_id = self.store_id.ok_or_else(|| required_errors("store_id"))?;

        Ok(ProductInput {
            name: self.name.trim().to_owned(),
            description: non_empty(self.description),
            price,
            stock,
            category_id,
            store_id,
            active: self.active,
        })
    }
}

/// Read a product submission from a multipart body.
///
/// # Errors
///
/// Returns [`AdminError::BadRequest`] when a field cannot be read or a
/// numeric field does not parse.
pub async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(ProductForm, Option<ImageUpload>), AdminError> {
    let mut form = ProductForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "name" => form.name = field.text().await.map_err(bad_multipart)?,
            "description" => form.description = field.text().await.map_err(bad_multipart)?,
            "price" => {
                form.price = parse_price(&field.text().await.map_err(bad_multipart)?)?;
            }
            "stock" => {
                form.stock = parse_stock(&field.text().await.map_err(bad_multipart)?)?;
            }
            "productsCategoryId" => {
                form.category_id = parse_reference(
                    &field.text().await.map_err(bad_multipart)?,
                    "Selecciona una categoría válida.",
                )?
                .map(CategoryId::new);
            }
            "storeId" => {
                form.store_id = parse_reference(
                    &field.text().await.map_err(bad_multipart)?,
                    "Selecciona una tienda válida.",
                )?
                .map(StoreId::new);
            }
            "active" => {
                form.active = parse_flag(&field.text().await.map_err(bad_multipart)?)?;
            }
            "image" => image = read_image(field).await?,
            _ => {}
        }
    }

    Ok((form, image))
}

// =============================================================================
// Store Form
// =============================================================================

/// A store form submitted as JSON, with the backend's wire key spellings.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_store_schedule"))]
pub struct StoreForm {
    #[validate(custom(
        function = "required_trimmed",
        message = "El nombre del establecimiento es obligatorio."
    ))]
    pub name: String,
    #[validate(custom(
        function = "required_trimmed",
        message = "La dirección es obligatoria."
    ))]
    pub address: String,
    #[validate(custom(
        function = "required_trimmed",
        message = "El teléfono es obligatorio."
    ))]
    pub phone: String,
    #[serde(default)]
    pub description: String,
    /// The active flag; store writes spell it `state`.
    pub state: bool,
    pub all_day: bool,
    /// Opening time, `HH:MM`; ignored when `all_day` is set.
    #[serde(default)]
    pub init: String,
    /// Closing time, `HH:MM`; ignored when `all_day` is set.
    #[serde(default)]
    pub close: String,
    /// 0 = Sunday .. 6 = Saturday; omit for stores with no closing day.
    #[validate(range(min = 0, max = 6, message = "El día de descanso no es válido."))]
    pub day_off: Option<u8>,
    pub lat: f64,
    pub long: f64,
}

impl StoreForm {
    /// Validate and convert into the backend write shape.
    ///
    /// All-day stores always submit `00:00`-`23:59`, whatever the time
    /// fields held.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation failures.
    pub fn into_input(self) -> Result<StoreInput, ValidationErrors> {
        self.validate()?;

        let (init, close) = if self.all_day {
            ("00:00".to_owned(), "23:59".to_owned())
        } else {
            (self.init.trim().to_owned(), self.close.trim().to_owned())
        };

        Ok(StoreInput {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            description: self.description.trim().to_owned(),
            state: self.state,
            all_day: self.all_day,
            init,
            close,
            day_off: self.day_off,
            lat: Some(self.lat),
            long: Some(self.long),
        })
    }
}

/// Opening and closing times must both be present and well-formed unless the
/// store is open all day.
fn validate_store_schedule(form: &StoreForm) -> Result<(), ValidationError> {
    if form.all_day {
        return Ok(());
    }
    if form.init.trim().is_empty() || form.close.trim().is_empty() {
        let mut error = ValidationError::new("schedule");
        error.message = Some("Debes especificar el horario de apertura y cierre.".into());
        return Err(error);
    }
    if parse_time(&form.init).is_none() || parse_time(&form.close).is_none() {
        let mut error = ValidationError::new("schedule_format");
        error.message = Some("El horario debe tener el formato HH:MM.".into());
        return Err(error);
    }
    Ok(())
}

// =============================================================================
// Category Form
// =============================================================================

/// A category form parsed from a multipart submission.
#[derive(Debug, Default, Validate)]
pub struct CategoryForm {
    #[validate(custom(
        function = "required_trimmed",
        message = "El nombre de la categoría es obligatorio."
    ))]
    pub name: String,
    /// Position in the storefront category rail; lower sorts first.
    pub order: Option<i32>,
}

impl CategoryForm {
    /// Validate and convert into the backend write shape.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation failures.
    pub fn into_input(self) -> Result<CategoryInput, ValidationErrors> {
        self.validate()?;
        Ok(CategoryInput {
            name: self.name.trim().to_owned(),
            order: self.order,
        })
    }
}

/// Read a category submission from a multipart body.
///
/// # Errors
///
/// Returns [`AdminError::BadRequest`] when a field cannot be read or the
/// order does not parse.
pub async fn read_category_form(
    mut multipart: Multipart,
) -> Result<(CategoryForm, Option<ImageUpload>), AdminError> {
    let mut form = CategoryForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "name" => form.name = field.text().await.map_err(bad_multipart)?,
            "order" => {
                form.order = parse_order(&field.text().await.map_err(bad_multipart)?)?;
            }
            "image" => image = read_image(field).await?,
            _ => {}
        }
    }

    Ok((form, image))
}

// =============================================================================
// Image Validation
// =============================================================================

/// Check an uploaded image's content type and size.
///
/// # Errors
///
/// Returns the failures keyed under `image`.
pub fn validate_image(image: &ImageUpload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !IMAGE_CONTENT_TYPES.contains(&image.content_type.as_str()) {
        let mut error = ValidationError::new("content_type");
        error.message = Some("Por favor, sube una imagen en formato JPG, PNG o WebP".into());
        errors.add("image", error);
    } else if image.bytes.len() > MAX_IMAGE_BYTES {
        let mut error = ValidationError::new("size");
        error.message = Some("La imagen no debe superar los 5MB".into());
        errors.add("image", error);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Read the image field into an upload, skipping empty file inputs.
async fn read_image(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<ImageUpload>, AdminError> {
    let file_name = field.file_name().unwrap_or("upload").to_owned();
    let content_type = field.content_type().unwrap_or_default().to_owned();
    let bytes = field.bytes().await.map_err(bad_multipart)?;

    // A file input submitted without a selection arrives as an empty part.
    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

// =============================================================================
// Field Parsing
// =============================================================================

/// Non-empty after trimming; the attribute supplies the message.
fn required_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("negative"));
    }
    Ok(())
}

/// A one-field `ValidationErrors` carrying the required-field message.
fn required_errors(field: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let mut error = ValidationError::new("required");
    error.message = Some(REQUIRED_MESSAGE.into());
    errors.add(field, error);
    errors
}

fn parse_price(raw: &str) -> Result<Option<Decimal>, AdminError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<Decimal>().map(Some).map_err(|_| {
        AdminError::BadRequest("El precio debe ser un número válido.".to_owned())
    })
}

fn parse_stock(raw: &str) -> Result<Option<u32>, AdminError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<u32>().map(Some).map_err(|_| {
        AdminError::BadRequest("El stock debe ser un número entero no negativo.".to_owned())
    })
}

fn parse_reference(raw: &str, message: &str) -> Result<Option<i64>, AdminError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| AdminError::BadRequest(message.to_owned()))
}

fn parse_order(raw: &str) -> Result<Option<i32>, AdminError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i32>().map(Some).map_err(|_| {
        AdminError::BadRequest("El orden debe ser un número entero.".to_owned())
    })
}

/// The active flag arrives as `1`/`0` or `true`/`false` depending on which
/// form posted it.
fn parse_flag(raw: &str) -> Result<bool, AdminError> {
    match raw.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(AdminError::BadRequest(
            "El estado enviado no es válido.".to_owned(),
        )),
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

fn bad_multipart(source: axum::extract::multipart::MultipartError) -> AdminError {
    tracing::warn!(error = %source, "Rejected unreadable multipart submission");
    AdminError::BadRequest("No se pudo leer el formulario enviado.".to_owned())
}

/// Treat empty and whitespace-only strings as absent.
fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_store_form() -> StoreForm {
        StoreForm {
            name: "Bodega Central".to_owned(),
            address: "Av. Principal #123".to_owned(),
            phone: "956111222".to_owned(),
            description: String::new(),
            state: true,
            all_day: false,
            init: "08:00".to_owned(),
            close: "20:00".to_owned(),
            day_off: Some(0),
            lat: -14.8356,
            long: -74.9399,
        }
    }

    #[test]
    fn test_store_form_requires_contact_fields() {
        let mut form = valid_store_form();
        form.name = "   ".to_owned();
        form.address = String::new();
        form.phone = String::new();

        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        let message = |field: &str| {
            fields.get(field).unwrap().first().unwrap().message.clone().unwrap()
        };

        assert_eq!(message("name"), "El nombre del establecimiento es obligatorio.");
        assert_eq!(message("address"), "La dirección es obligatoria.");
        assert_eq!(message("phone"), "El teléfono es obligatorio.");
    }

    #[test]
    fn test_store_form_schedule_requires_both_times() {
        let mut form = valid_store_form();
        form.close = String::new();

        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        let schedule = fields.get("__all__").unwrap().first().unwrap();
        assert_eq!(
            schedule.message.clone().unwrap(),
            "Debes especificar el horario de apertura y cierre."
        );
    }

    #[test]
    fn test_store_form_rejects_malformed_times() {
        let mut form = valid_store_form();
        form.init = "8am".to_owned();

        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("__all__"));
    }

    #[test]
    fn test_store_form_all_day_skips_time_checks() {
        let mut form = valid_store_form();
        form.all_day = true;
        form.init = String::new();
        form.close = String::new();

        let input = form.into_input().unwrap();
        assert_eq!(input.init, "00:00");
        assert_eq!(input.close, "23:59");
    }

    #[test]
    fn test_store_form_rejects_day_off_out_of_range() {
        let mut form = valid_store_form();
        form.day_off = Some(7);
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_store_form_json_uses_wire_keys() {
        let form: StoreForm = serde_json::from_str(
            r#"{"name": "Bodega", "address": "Av. 1", "phone": "956", "state": true,
                "allDay": true, "dayOff": 0, "lat": -14.8, "long": -74.9}"#,
        )
        .unwrap();
        assert!(form.all_day);
        assert!(form.init.is_empty());
    }

    #[test]
    fn test_product_form_requires_core_fields() {
        let errors = ProductForm::default().into_input().unwrap_err();
        let fields = errors.field_errors();

        for field in ["name", "price", "stock", "category_id", "store_id"] {
            let message = fields.get(field).unwrap().first().unwrap().message.clone();
            assert_eq!(message.unwrap(), REQUIRED_MESSAGE, "field {field}");
        }
    }

    #[test]
    fn test_product_form_rejects_negative_price() {
        let form = ProductForm {
            name: "Pan".to_owned(),
            price: Some(Decimal::from(-1)),
            stock: Some(5),
            category_id: Some(CategoryId::new(1)),
            store_id: Some(StoreId::new(1)),
            ..ProductForm::default()
        };

        let errors = form.into_input().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn test_product_form_converts_when_valid() {
        let form = ProductForm {
            name: "  Pan Francés  ".to_owned(),
            description: "   ".to_owned(),
            price: Some(Decimal::new(50, 2)),
            stock: Some(12),
            category_id: Some(CategoryId::new(2)),
            store_id: Some(StoreId::new(1)),
            active: true,
        };

        let input = form.into_input().unwrap();
        assert_eq!(input.name, "Pan Francés");
        assert_eq!(input.description, None);
        assert_eq!(input.price.to_string(), "0.50");
    }

    #[test]
    fn test_parse_flag_accepts_both_dialects() {
        assert!(parse_flag("1").unwrap());
        assert!(parse_flag("true").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("false").unwrap());
        assert!(parse_flag("yes").is_err());
    }

    #[test]
    fn test_parse_price_distinguishes_empty_from_invalid() {
        assert_eq!(parse_price("  ").unwrap(), None);
        assert_eq!(parse_price("2.50").unwrap(), Some(Decimal::new(250, 2)));
        assert!(parse_price("abc").is_err());
    }

    #[test]
    fn test_validate_image_rules() {
        let image = ImageUpload {
            file_name: "logo.png".to_owned(),
            content_type: "image/png".to_owned(),
            bytes: vec![0; 16],
        };
        assert!(validate_image(&image).is_ok());

        let wrong_type = ImageUpload {
            content_type: "application/pdf".to_owned(),
            ..image.clone()
        };
        let errors = validate_image(&wrong_type).unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(
            fields.get("image").unwrap().first().unwrap().message.clone().unwrap(),
            "Por favor, sube una imagen en formato JPG, PNG o WebP"
        );

        let too_big = ImageUpload {
            bytes: vec![0; MAX_IMAGE_BYTES + 1],
            ..image
        };
        let errors = validate_image(&too_big).unwrap_err();
        assert!(errors.field_errors().contains_key("image"));
    }

    #[test]
    fn test_category_form_requires_name() {
        let errors = CategoryForm::default().into_input().unwrap_err();
        let message = errors
            .field_errors()
            .get("name")
            .unwrap()
            .first()
            .unwrap()
            .message
            .clone()
            .unwrap();
        assert_eq!(message, "El nombre de la categoría es obligatorio.");
    }
}
