use serde::Deserialize;
use tracing::debug;

use crate::{
    command::CommandSpec, error::WeatherError, model::Coordinates, payload::extract_object,
    provider::LocatorId,
};

const IPINFO_URL: &str = "https://ipinfo.io/json";

/// Command that prints the current position for the given source.
pub(crate) fn locate_command(locator: LocatorId) -> CommandSpec {
    match locator {
        LocatorId::Whereami => CommandSpec::new("whereami", vec!["-f".into(), "json".into()]),
        LocatorId::IpInfo => CommandSpec::new("curl", vec!["--silent".into(), IPINFO_URL.into()]),
    }
}

/// Parse coordinates out of a locator's output.
///
/// Accepts `latitude`/`longitude` fields (numbers or numeric strings) or an ipinfo-style `"loc": "lat,lon"`
/// string. When `precision` is set both components are rounded to that many digits.
pub fn parse_coordinates(text: &str, precision: Option<u32>) -> Result<Coordinates, WeatherError> {
    let fail = |reason: &str| {
        debug!(reason, "Unparseable locator output");
        WeatherError::CantGetGpsCoordinates {
            reason: reason.to_owned(),
            output: text.to_owned(),
        }
    };

    let output: LocatorOutput = extract_object(text).map_err(|reason| fail(&reason))?;

    let coordinates = match (
        output.latitude.as_ref().and_then(Degrees::value),
        output.longitude.as_ref().and_then(Degrees::value),
    ) {
        (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude),
        _ => output
            .loc
            .as_deref()
            .and_then(split_loc)
            .ok_or_else(|| fail("output has no latitude and longitude"))?,
    };

    Ok(match precision {
        Some(ndigits) => coordinates.rounded(ndigits),
        None => coordinates,
    })
}

/// Fields shared by whereami (`latitude`/`longitude`) and ipinfo (`loc`) output.
#[derive(Debug, Deserialize)]
struct LocatorOutput {
    latitude: Option<Degrees>,
    longitude: Option<Degrees>,
    loc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn value(&self) -> Option<f64> {
        match self {
            Degrees::Number(value) => Some(*value),
            Degrees::Text(text) => text.trim().parse().ok(),
        }
    }
}

fn split_loc(loc: &str) -> Option<Coordinates> {
    let (lat, lon) = loc.split_once(',')?;
    Some(Coordinates::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}
