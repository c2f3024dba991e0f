//! Setlist PDF checks and storage paths

use chrono::{DateTime, Utc};
use encore_domain::constants::{PDF_CONTENT_TYPE, SETLIST_PDF_MAX_BYTES};
use encore_domain::{EncoreError, Result};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Reject anything that is not a reasonably sized PDF.
pub fn validate_setlist_pdf(content_type: &str, bytes: &[u8]) -> Result<()> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        return Err(EncoreError::InvalidInput(format!(
            "Setlist must be a PDF (got {content_type})"
        )));
    }
    if bytes.is_empty() {
        return Err(EncoreError::InvalidInput("Uploaded file is empty".to_string()));
    }
    if bytes.len() > SETLIST_PDF_MAX_BYTES {
        return Err(EncoreError::InvalidInput(format!(
            "Setlist PDF exceeds {} MiB",
            SETLIST_PDF_MAX_BYTES / (1024 * 1024)
        )));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(EncoreError::InvalidInput("File is not a valid PDF".to_string()));
    }
    Ok(())
}

/// `{gig_id}/setlist-{unix_millis}.pdf`
pub fn setlist_pdf_path(gig_id: &str, at: DateTime<Utc>) -> String {
    format!("{gig_id}/setlist-{}.pdf", at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn accepts_pdf() {
        assert!(validate_setlist_pdf("application/pdf", b"%PDF-1.7\n...").is_ok());
        assert!(validate_setlist_pdf("Application/PDF; charset=binary", b"%PDF-1.4").is_ok());
    }

    #[test]
    fn rejects_wrong_type_or_magic() {
        assert!(validate_setlist_pdf("image/png", b"%PDF-1.7").is_err());
        assert!(validate_setlist_pdf("application/pdf", b"PK\x03\x04").is_err());
        assert!(validate_setlist_pdf("application/pdf", b"").is_err());
    }

    #[test]
    fn rejects_oversized() {
        let mut bytes = b"%PDF".to_vec();
        bytes.resize(SETLIST_PDF_MAX_BYTES + 1, 0);
        let err = validate_setlist_pdf("application/pdf", &bytes).unwrap_err();
        assert!(err.message().contains("10 MiB"));
    }

    #[test]
    fn path_is_timestamped() {
        let at = Utc.timestamp_millis_opt(1_718_000_000_123).unwrap();
        assert_eq!(setlist_pdf_path("gig-1", at), "gig-1/setlist-1718000000123.pdf");
    }
}
