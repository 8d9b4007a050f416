use subtle::ConstantTimeEq;

/// Constant-time equality for shared secrets such as admin keys.
///
/// Lengths are compared first; only the contents comparison is constant-time.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();

    if expected.len() != provided.len() {
        return false;
    }

    expected.ct_eq(provided).into()
}
