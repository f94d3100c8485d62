//! The seam between the request engine and whatever turns an XSAMS
//! document into a typed model.
//!
//! The engine never looks inside a response body. On a successful query it
//! wraps the raw bytes in a [`QueryResult`] and, when asked to, hands them
//! to a [`DocumentParser`].

/// Error returned by a [`DocumentParser`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Populates a typed document from raw response bytes.
pub trait DocumentParser {
    type Document;

    fn populate(&self, xml: &[u8]) -> Result<Self::Document, ParseError>;
}

/// The default parser: checks that the body is UTF-8 and returns it as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlText;

impl DocumentParser for XmlText {
    type Document = String;

    fn populate(&self, xml: &[u8]) -> Result<String, ParseError> {
        String::from_utf8(xml.to_vec())
            .map_err(|e| ParseError::new(format!("response is not valid UTF-8: {e}")))
    }
}

impl<D, F> DocumentParser for F
where
    F: Fn(&[u8]) -> Result<D, ParseError>,
{
    type Document = D;

    fn populate(&self, xml: &[u8]) -> Result<D, ParseError> {
        self(xml)
    }
}

/// The outcome of a successful (HTTP 200) query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<D> {
    /// The response body exactly as received.
    pub content: Vec<u8>,

    /// The populated document; `None` when the query ran with
    /// `parse_content = false`.
    pub document: Option<D>,
}

impl<D> QueryResult<D> {
    pub fn raw(content: Vec<u8>) -> Self {
        Self {
            content,
            document: None,
        }
    }

    pub fn populate<P>(content: Vec<u8>, parser: &P) -> Result<Self, ParseError>
    where
        P: DocumentParser<Document = D>,
    {
        let document = parser.populate(&content)?;
        Ok(Self {
            content,
            document: Some(document),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_text_accepts_utf8() {
        let doc = XmlText.populate(b"<XSAMSData/>").unwrap();
        assert_eq!(doc, "<XSAMSData/>");
    }

    #[test]
    fn xml_text_rejects_invalid_utf8() {
        assert!(XmlText.populate(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn closures_are_parsers() {
        let count_bytes = |xml: &[u8]| -> Result<usize, ParseError> { Ok(xml.len()) };
        let result = QueryResult::populate(b"abc".to_vec(), &count_bytes).unwrap();
        assert_eq!(result.document, Some(3));
        assert_eq!(result.content, b"abc");
    }

    #[test]
    fn raw_result_has_no_document() {
        let result: QueryResult<String> = QueryResult::raw(b"<x/>".to_vec());
        assert!(result.document.is_none());
    }
}
