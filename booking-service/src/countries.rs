use isocountry::CountryCode;

/// Matches free-form input to an ISO 3166-1 country: alpha-2/alpha-3 codes, then exact
/// names, then the shortest name that starts with or contains the input.
pub fn resolve_country(input: &str) -> Option<CountryCode> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(code) = CountryCode::for_alpha2_caseless(input) {
        return Some(code);
    }
    if let Ok(code) = CountryCode::for_alpha3_caseless(input) {
        return Some(code);
    }

    let needle = input.to_lowercase();
    let names = || CountryCode::iter().map(|code| (*code, code.name().to_lowercase()));

    if let Some((code, _)) = names().find(|(_, name)| *name == needle) {
        return Some(code);
    }
    if needle.chars().count() < 3 {
        return None;
    }

    names()
        .filter(|(_, name)| name.starts_with(&needle))
        .min_by_key(|(_, name)| name.len())
        .or_else(|| {
            names()
                .filter(|(_, name)| name.contains(&needle))
                .min_by_key(|(_, name)| name.len())
        })
        .map(|(code, _)| code)
}
