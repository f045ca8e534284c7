//! Shared test fixtures for the OncoFair workspace.
//!
//! CSV uploads shaped like the ones the service receives, a hand-rolled
//! multipart body builder for router tests, and a couple of JSON helpers.

pub use pretty_assertions::assert_eq;

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "oncofair-test-boundary";

/// HER2 upload: six labelled rows across two ancestry groups, plus one
/// unlabelled row that still counts towards the demographic distribution.
pub const HER2_CSV: &str = "\
case_id,brca1,brca2,race,ancestry,her2_status
TCGA-01,0.10,1.20,White,European,0
TCGA-02,0.90,3.40,White,European,1
TCGA-03,0.20,,Asian,East Asian,0
TCGA-04,0.80,2.90,Black,African,1
TCGA-05,0.55,2.10,Black,African,1
TCGA-06,0.30,1.10,Asian,East Asian,0
TCGA-07,0.40,1.50,White,European,
";

/// Lung upload with three subtypes and race only (no ancestry column).
pub const LUNG_CSV: &str = "\
case_id,EGFR_mutation_status,KRAS_mutation_status,race,cancer_subtype
LUAD-01,1,0,Asian,0
LUAD-02,1,0,Asian,0
LUAD-03,0,1,White,1
LUAD-04,0,0,White,2
LUAD-05,0,1,Black,1
LUAD-06,,0,White,2
";

/// Upload with biomarkers but neither target column.
pub const NO_TARGET_CSV: &str = "\
case_id,brca1,brca2,EGFR_mutation_status,KRAS_mutation_status,race,ancestry
X-01,0.1,0.2,1,0,White,European
X-02,0.3,0.4,0,1,Asian,East Asian
";

/// Build a `multipart/form-data` body with a single file field.
pub fn multipart_body(boundary: &str, field: &str, filename: &str, content: &str) -> Vec<u8> {
    format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    )
    .into_bytes()
}

/// `Content-Type` header value matching [`multipart_body`] with [`BOUNDARY`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Parse a response body as JSON, panicking with the raw text on failure.
pub fn json_body(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        panic!("invalid JSON ({e}): {}", String::from_utf8_lossy(bytes))
    })
}

/// Float comparison with an absolute tolerance.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multipart_body_layout() {
        let body = String::from_utf8(multipart_body(BOUNDARY, "file", "x.csv", "a,b\n1,2")).unwrap();
        assert!(body.starts_with("--oncofair-test-boundary\r\n"));
        assert!(body.contains("name=\"file\"; filename=\"x.csv\""));
        assert!(body.ends_with("--oncofair-test-boundary--\r\n"));
    }

    #[test]
    fn test_json_body_parses() {
        let v = json_body(br#"{"detail":"x"}"#);
        assert_eq!(v["detail"], "x");
    }
}
