use crate::error::ProviderError;
use crate::models::landing_models::Coordinate;

const PRECISION: f64 = 1e5;
const MAX_SHIFT: u32 = 35;

/// Decodes a Google encoded polyline into its points.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, ProviderError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, next_delta(bytes, &mut index)?)?;
        lng = accumulate(lng, next_delta(bytes, &mut index)?)?;
        points.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Ok(points)
}

fn accumulate(total: i64, delta: i64) -> Result<i64, ProviderError> {
    total
        .checked_add(delta)
        .ok_or_else(|| ProviderError::Malformed("polyline coordinate out of range".to_string()))
}

// A delta spans at most seven 5-bit chunks; anything longer is garbage.
fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, ProviderError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *bytes
            .get(*index)
            .ok_or_else(|| ProviderError::Malformed("truncated polyline".to_string()))?;
        *index += 1;
        if !(63..=126).contains(&byte) || shift >= MAX_SHIFT {
            return Err(ProviderError::Malformed(format!(
                "invalid polyline byte at {}",
                *index - 1
            )));
        }
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}
