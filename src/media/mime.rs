pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
];

/// Content type for a filename, judged by its extension alone.
///
/// Total over all inputs: no extension, or one we don't know, yields
/// `application/octet-stream`.
pub fn resolve(filename: &str) -> &'static str {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return DEFAULT_CONTENT_TYPE;
    };
    let ext = ext.to_ascii_lowercase();

    EXTENSION_TABLE
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve("report.pdf"), "application/pdf");
        assert_eq!(resolve("report.PDF"), "application/pdf");
        assert_eq!(resolve("Planilha.XlSx"), EXTENSION_TABLE[4].1);
    }

    #[test]
    fn test_last_extension_wins() {
        assert_eq!(resolve("backup.pdf.csv"), "text/csv");
        assert_eq!(resolve("song.final.mp3"), "audio/mpeg");
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(resolve("file"), DEFAULT_CONTENT_TYPE);
        assert_eq!(resolve("archive.tar.gz"), DEFAULT_CONTENT_TYPE);
        assert_eq!(resolve("trailing."), DEFAULT_CONTENT_TYPE);
        assert_eq!(resolve(""), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_table_covers_office_and_media() {
        for name in [
            "a.doc", "a.docx", "a.xls", "a.xlsx", "a.ppt", "a.pptx", "a.txt", "a.jpg", "a.png",
            "a.mp4",
        ] {
            assert_ne!(resolve(name), DEFAULT_CONTENT_TYPE, "{name}");
        }
    }
}
