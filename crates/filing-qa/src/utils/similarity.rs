use crate::utils::error::QaError;

/// Dot product of two embedding vectors of equal dimension.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, QaError> {
    if a.len() != b.len() {
        return Err(QaError::InvalidInput(format!(
            "Vector dimensions must match: {} != {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(QaError::InvalidInput("Vectors cannot be empty".to_string()));
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}
