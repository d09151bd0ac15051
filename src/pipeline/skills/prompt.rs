pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are an expert at extracting structured information from invoices.
Your ONLY role is to copy values that are explicitly present in the document
into a fixed JSON structure.

RULES:
1. Extract ONLY information explicitly stated in the document.
2. Preserve invoice numbers, dates and currency codes exactly as written.
3. Amounts are plain numbers without currency symbols or thousands separators.
4. Currency is an ISO 4217 code (USD, EUR, GBP, ...).
5. If a text field is missing, use "N/A". If a number is missing, use 0.0.
6. Output a single JSON object wrapped in ```json``` fences and nothing else.
"#;

pub const TRANSLATION_SYSTEM_PROMPT: &str = r#"
You are a professional translator for business documents.
Only provide the translated text. Do not add conversational phrases,
explanations or notes. Keep numbers, codes and amounts unchanged.
"#;

pub const SUMMARIZATION_SYSTEM_PROMPT: &str = r#"
You summarize invoice processing reports concisely and accurately.
Focus on the main points: who issued the invoice, the amount and currency,
whether translation was needed, and the validation result.
"#;

/// Build the extraction prompt for one document.
pub fn build_extraction_prompt(document_text: &str) -> String {
    format!(
        r#"<document>
{document_text}
</document>

Extract the invoice details from the above document into the following JSON structure:

```json
{{
  "invoice_number": "The unique invoice identification number",
  "issue_date": "The date the invoice was issued (YYYY-MM-DD)",
  "total_amount": 0.0,
  "currency": "ISO currency code, e.g. USD or EUR",
  "line_items": [
    {{"description": "item description", "quantity": 1, "unit_price": 0.0}}
  ]
}}
```"#
    )
}

pub fn build_translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text to {target_language}.\n\n\
         Text to translate:\n{text}"
    )
}

pub fn build_summarization_prompt(text: &str) -> String {
    format!(
        "Summarize the following text concisely and accurately.\n\
         Focus on the main points and key information.\n\n\
         Text to summarize:\n{text}"
    )
}
