//! Prompt text sent with every classification request.

pub(crate) const SYSTEM_PROMPT: &str = "You classify search queries for a coffee shop discovery app. \
Recognise coffee shop names even when they are unusual or use technical words. \
Reply with a single JSON object matching the requested shape and nothing else.";

/// Renders the user turn for `query`, with `user_location` as advisory
/// context (`"lat,lng"` or `"unknown"`).
pub(crate) fn user_prompt(query: &str, user_location: &str) -> String {
    format!(
        r#"Classify this coffee shop search. The user's current location is: {user_location}

Query: "{query}"

Classification rules:
1. Multi-word phrases followed by "coffee", "cafe" or "roasters", or placed before "in", "near" or "at", are likely shop names.
2. When a shop name is present, always use "specific" and put the full name in terms.shop.
3. "near", "around" or current-location wording without a shop name is "proximity".
4. A named place or area without a shop name is "area".
5. For proximity searches give a reasonable radius in meters.
6. Put drinks and features (e.g. "matcha latte", "pour-over", "wifi") in terms.filters. Never put shop names there.
7. Remove only standalone filler words; keep multi-word drink names as one filter.

Location names:
- Use full city names ("Los Angeles", not "LA"; "New York City", not "NYC"; "San Francisco", not "SF").
- "OC" is "Orange County"; "DTLA" is "Downtown Los Angeles".
- Neighbourhoods use "Area, City" (e.g. "Little Tokyo, Los Angeles").
- States use standard US abbreviations (CA, NY).
- For current-location searches use the provided user location unchanged.

Examples:
- "File Systems of Coffee in LA" -> specific, shop "File Systems of Coffee", location "Los Angeles"
- "Stereoscope Coffee near me" -> specific, shop "Stereoscope Coffee"
- "matcha lattes in DTLA" -> area, location "Downtown Los Angeles", filters ["matcha latte"]
- "coffee near me" -> proximity

Reply shape:
{{
  "searchType": "specific" | "area" | "proximity",
  "normalizedQuery": "normalized search terms",
  "location": {{ "name": "location name", "radius": 5000 }},
  "terms": {{ "shop": "shop name", "filters": ["filter"] }}
}}"#
    )
}
