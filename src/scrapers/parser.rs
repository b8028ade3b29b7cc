//! Heuristic parser for nepremicnine.net listing text
//!
//! Listing text has no stable grammar, so fields are located by scanning the
//! whitespace-split tokens for fixed marker tokens and reading their neighbours.
//! A marker that is missing leaves its field empty; nothing here fails.

use crate::models::{ListingLayout, OfferType, ParsedListing, RawListingBlock};

const ROOMS_SUFFIX: &str = "-sobno";
const AREA_MARKER: &str = "m2";
const RENOVATED_MARKER: &str = "adaptirano";
const PRIVATE_MARKER: &str = "Zasebna";
const PRICE_MARKER: &str = "€";
const HOUSE_MARKER: &str = "Hiša,";
const HOUSE_CATEGORY: &str = "hisa";

/// Tokens that land in the renovation slot when the listing has no renovation year
const RENOVATION_NOISE: [&str; 3] = ["Stanovanje", "Hiša", "spreglejte"];

/// Newer buildings carry layout debris where the renovation year would be
const RECENT_BUILD_YEAR: f64 = 2016.0;

/// Parse one listing block into its typed fields
pub fn parse_listing(block: &RawListingBlock) -> ParsedListing {
    let tokens: Vec<&str> = block.text.split_whitespace().collect();

    let (area_sqm, year_built) = match &block.layout {
        ListingLayout::Described { area, year_built } => (
            decimal(&area.replace(" m2", "")),
            year_built
                .as_deref()
                .map(str::trim)
                .filter(|y| !y.is_empty())
                .map(str::to_string),
        ),
        ListingLayout::TextOnly => area_and_year(&tokens),
    };

    let year_renovated = renovation_year(&tokens, year_built.as_deref());

    let property_type_detail = if block.context.category == HOUSE_CATEGORY {
        position(&tokens, HOUSE_MARKER)
            .and_then(|i| tokens.get(i + 1))
            .map(|t| t.to_string())
    } else {
        None
    };

    let offer_type = if tokens.contains(&PRIVATE_MARKER) {
        OfferType::Private
    } else {
        OfferType::Agency
    };

    ParsedListing {
        category: block.context.category.clone(),
        room_count: room_count(&tokens),
        property_type_detail,
        region: block.context.region.clone(),
        location_detail: block.title.clone(),
        area_sqm,
        year_built,
        year_renovated,
        offer_type,
        price: price(&tokens),
    }
}

fn position(tokens: &[&str], marker: &str) -> Option<usize> {
    tokens.iter().position(|t| *t == marker)
}

/// `"2,5-sobno"` -> 2.5
fn room_count(tokens: &[&str]) -> Option<f64> {
    tokens
        .iter()
        .find(|t| t.contains(ROOMS_SUFFIX))
        .and_then(|t| decimal(&t.replace(ROOMS_SUFFIX, "")))
}

/// Area is the token before `m2`, build year the token after it.
fn area_and_year(tokens: &[&str]) -> (Option<f64>, Option<String>) {
    let Some(i) = position(tokens, AREA_MARKER) else {
        return (None, None);
    };

    let area = i
        .checked_sub(1)
        .and_then(|prev| tokens.get(prev))
        .and_then(|t| decimal(t));
    let year = tokens
        .get(i + 1)
        .map(|t| t.trim_end_matches(','))
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    (area, year)
}

fn renovation_year(tokens: &[&str], year_built: Option<&str>) -> Option<String> {
    if year_built
        .and_then(|y| y.trim().parse::<f64>().ok())
        .is_some_and(|y| y > RECENT_BUILD_YEAR)
    {
        return None;
    }

    let value = position(tokens, RENOVATED_MARKER)
        .and_then(|i| tokens.get(i + 2))
        .map(|t| t.replace([',', '"'], ""))?;

    if RENOVATION_NOISE.contains(&value.as_str()) {
        return None;
    }
    Some(value)
}

/// `"189.000,00"` -> `"189.000"`
fn price(tokens: &[&str]) -> Option<String> {
    let raw = position(tokens, PRICE_MARKER)
        .and_then(|i| i.checked_sub(1))
        .and_then(|prev| tokens.get(prev).copied())?;

    let cleaned = raw.strip_suffix(",00").unwrap_or(raw).replace('"', "");
    let whole = cleaned.split(',').next().unwrap_or_default();
    if whole.is_empty() {
        None
    } else {
        Some(whole.to_string())
    }
}

/// Parse a comma-decimal number, reading only its leading numeric part
fn decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replacen(',', ".", 1);
    let end = normalized
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(normalized.len());

    let number = &normalized[..end];
    // "1.234.5" has no valid prefix parse; fall back to the longest one that does
    (1..=number.len())
        .rev()
        .find_map(|len| number[..len].parse::<f64>().ok())
}
