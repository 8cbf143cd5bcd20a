use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use igpack_schema::FhirRelease;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("library resource parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("attachment base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("no usable content attachment (expected {expected})")]
    NoUsableContent { expected: String },
}

#[derive(Debug, Deserialize)]
struct LibraryResource {
    #[serde(default)]
    content: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attachment {
    content_type: Option<String>,
    data: Option<String>,
}

/// Decodes library resource content for a target FHIR version band.
///
/// A library resource carries one or more content attachments. The plain
/// `text/cql` source is preferred when present; otherwise the compiled ELM
/// representation the target band expects is used. Pure transformation — no
/// I/O beyond the bytes handed in.
#[derive(Debug, Clone, Copy)]
pub struct ContentLoader {
    release: FhirRelease,
}

impl ContentLoader {
    pub fn new(release: FhirRelease) -> Self {
        Self { release }
    }

    /// The compiled-content media type for the target band. DSTU3 tooling
    /// shipped XML ELM; R4 and later ship JSON ELM.
    fn elm_content_type(self) -> &'static str {
        match self.release {
            FhirRelease::Dstu3 => "application/elm+xml",
            FhirRelease::R4 | FhirRelease::R4B | FhirRelease::R5 => "application/elm+json",
        }
    }

    /// Decode a library resource's content into raw source bytes.
    pub fn load(&self, resource_bytes: &[u8]) -> Result<Vec<u8>, ContentError> {
        let library: LibraryResource = serde_json::from_slice(resource_bytes)?;

        let elm = self.elm_content_type();
        let attachment = find_attachment(&library.content, "text/cql")
            .or_else(|| find_attachment(&library.content, elm))
            .ok_or_else(|| ContentError::NoUsableContent {
                expected: format!("text/cql or {elm}"),
            })?;

        // find_attachment only returns attachments carrying data
        let data = attachment.data.as_deref().unwrap_or_default();
        Ok(BASE64.decode(data)?)
    }
}

fn find_attachment<'a>(content: &'a [Attachment], content_type: &str) -> Option<&'a Attachment> {
    content
        .iter()
        .find(|a| a.content_type.as_deref() == Some(content_type) && a.data.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_with(attachments: &[(&str, &str)]) -> Vec<u8> {
        let content: Vec<String> = attachments
            .iter()
            .map(|(ct, text)| {
                format!(
                    r#"{{ "contentType": "{ct}", "data": "{}" }}"#,
                    BASE64.encode(text)
                )
            })
            .collect();
        format!(
            r#"{{ "resourceType": "Library", "content": [ {} ] }}"#,
            content.join(", ")
        )
        .into_bytes()
    }

    #[test]
    fn prefers_plain_cql_source() {
        let loader = ContentLoader::new(FhirRelease::R4);
        let bytes = library_with(&[
            ("application/elm+json", "{\"library\":{}}"),
            ("text/cql", "library Example version '0.2.0'"),
        ]);
        let source = loader.load(&bytes).unwrap();
        assert_eq!(source, b"library Example version '0.2.0'");
    }

    #[test]
    fn falls_back_to_elm_json_for_r4() {
        let loader = ContentLoader::new(FhirRelease::R4);
        let bytes = library_with(&[("application/elm+json", "{\"library\":{}}")]);
        assert_eq!(loader.load(&bytes).unwrap(), b"{\"library\":{}}");
    }

    #[test]
    fn dstu3_expects_xml_elm() {
        let loader = ContentLoader::new(FhirRelease::Dstu3);
        let bytes = library_with(&[("application/elm+xml", "<library/>")]);
        assert_eq!(loader.load(&bytes).unwrap(), b"<library/>");

        // JSON ELM is not what a DSTU3 consumer expects
        let bytes = library_with(&[("application/elm+json", "{}")]);
        assert!(matches!(
            loader.load(&bytes),
            Err(ContentError::NoUsableContent { .. })
        ));
    }

    #[test]
    fn no_attachments_is_an_error_naming_expectations() {
        let loader = ContentLoader::new(FhirRelease::R5);
        let err = loader
            .load(br#"{ "resourceType": "Library", "content": [] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("text/cql"));
        assert!(err.to_string().contains("application/elm+json"));
    }

    #[test]
    fn attachment_without_data_is_skipped() {
        let loader = ContentLoader::new(FhirRelease::R4);
        let bytes = br#"{ "content": [ { "contentType": "text/cql" } ] }"#;
        assert!(matches!(
            loader.load(bytes),
            Err(ContentError::NoUsableContent { .. })
        ));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let loader = ContentLoader::new(FhirRelease::R4);
        let bytes = br#"{ "content": [ { "contentType": "text/cql", "data": "!!!" } ] }"#;
        assert!(matches!(loader.load(bytes), Err(ContentError::Base64(_))));
    }

    #[test]
    fn malformed_resource_is_a_json_error() {
        let loader = ContentLoader::new(FhirRelease::R4);
        assert!(matches!(
            loader.load(b"not json"),
            Err(ContentError::Json(_))
        ));
    }
}
