//! Fixed user-facing replies. Callers compare against these exact strings.

pub const NO_CONTEXT: &str = "No relevant context found in the filing for this question.";
pub const NO_QUESTION: &str = "Please provide a question.";
pub const NO_CONFIDENT_ANSWER: &str = "No confident answer found.";

pub fn retrieval_failed(ticker: &str) -> String {
    format!(
        "Could not retrieve SEC filing for {}. Please check the ticker symbol and try again.",
        ticker.trim().to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_failed_uppercases_ticker() {
        assert_eq!(
            retrieval_failed(" aapl "),
            "Could not retrieve SEC filing for AAPL. Please check the ticker symbol and try again."
        );
    }
}
