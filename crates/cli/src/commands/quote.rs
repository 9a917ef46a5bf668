//! Price a delivery to an address, the same way the storefront does.
//!
//! Geocodes the address within the service region, routes from the store
//! origin, and applies the tiered fee schedule. Useful for sanity-checking
//! fees without driving the whole quote flow through a browser.

use chrono::Timelike;
use tracing::info;

use mercadito_core::delivery::DeliveryQuote;
use mercadito_storefront::config::StorefrontConfig;
use mercadito_storefront::geo::GeoClient;

/// Geocode, route, and price a delivery to `address`.
///
/// # Errors
///
/// Returns an error if configuration is missing, the address matches
/// nothing, or a geo call fails.
pub async fn run(address: &str, at: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let geo = GeoClient::new(&config.geo)?;

    info!(address, "Geocoding");
    let matches = geo.geocode(address).await?;
    let Some(best) = matches.first() else {
        return Err(format!("No matches for '{address}' in the service region").into());
    };
    if matches.len() > 1 {
        info!("{} matches; quoting the first", matches.len());
    }

    let destination = best.coordinates();
    let route = geo.route_from_origin(destination).await?;

    let hour = at.unwrap_or_else(|| chrono::Local::now().hour());
    let quote = DeliveryQuote::from_route(
        destination,
        best.formatted_address.clone(),
        route.distance_meters,
        route.duration_seconds,
        hour,
    );

    info!("Delivery quote");
    info!("  Address:  {}", quote.address);
    info!(
        "  Position: {:.5}, {:.5}",
        quote.destination.latitude, quote.destination.longitude
    );
    info!("  Distance: {:.1} km", quote.distance_km);
    info!("  Duration: {} min", quote.duration_min);
    info!("  Fee:      ${} (quoted at {hour:02}:00)", quote.fee);

    Ok(())
}
