//! Prompt builders for the three generation calls the pipeline makes.
//!
//! The classify and extract prompts require a fenced ```json reply; parsing is
//! strict and fails closed (see `pricelens_llm::extract_json_output`).

/// Ask for the 0-based indices of results whose text carries an actual
/// numeric price.
pub fn classify_prompt(results_json: &str) -> String {
    format!(
        r#"TASK: Identify which of the search results below contain an ACTUAL numeric price value, not just price-related words.

Count as a price: numbers with currency symbols ($999, ₹1,299, €500), numbers with currency words (Rs.999, USD 500, INR 25000), pricing terms with numbers (MRP 999, Price: $500), financing amounts with numbers ($41.62/mo).
Do NOT count: price vocabulary without numbers ("check pricing", "best price"), bare currency symbols, or zero/free values.

SEARCH RESULTS:
{results_json}

Reply with a fenced ```json code block containing only a JSON array of the 0-based indices of results that contain a real price, e.g.:
```json
[1, 3, 7]
```"#
    )
}

/// Ask for `{{link, price}}` objects for results already known to carry a
/// price in their snippet or title.
pub fn extract_prompt(results_json: &str) -> String {
    format!(
        r#"Extract the price and link from each of the search results below.

RULES:
1. Pick the main product price; ignore shipping, tax, and monthly financing figures unless they are the only price present.
2. Keep the currency symbol or word with the number.
3. Remove thousands separators ("1,299" becomes "1299") but keep decimals ("999.99").
4. Use "0" when no clear price is present and "" when no link can be recovered.

SEARCH RESULTS:
{results_json}

Reply with a fenced ```json code block containing only a JSON array of objects, e.g.:
```json
[
  {{"link": "https://example.com/product", "price": "$999"}},
  {{"link": "https://another.example/item", "price": "1299 Rs"}}
]
```"#
    )
}

/// Ask for a single numeric price from scraped page content.
pub fn page_price_prompt(content: &str) -> String {
    format!(
        r#"Extract the main product price from this webpage content. Look for the primary selling price, not shipping, tax, or promotional figures; if several prices appear, choose the base/starting one. Remove thousands separators but keep decimals. If no price is found, answer "0".

CONTENT:
{content}

Answer with only the numeric price value (currency symbols allowed), nothing else."#
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────
