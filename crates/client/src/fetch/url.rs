//! Character page URL construction.

use armory_core::Error;
use url::Url;

/// Build the summary page URL for `character` on `realm`.
///
/// The result is `{base}/character/{character}/{realm}/summary`. Both the
/// character and realm are inserted as single path segments, so reserved
/// characters such as `/` or `?` are percent-encoded rather than changing
/// the path. Any query or fragment on `base` is dropped.
///
/// `.` and `..` are rejected: the url crate treats them as dot segments and
/// would resolve them away instead of encoding them.
pub fn character_url(base: &str, character: &str, realm: &str) -> Result<Url, Error> {
    let character = path_segment("character", character)?;
    let realm = path_segment("realm", realm)?;

    let mut url = Url::parse(base.trim()).map_err(|e| Error::InvalidInput(format!("invalid base url: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidInput(format!("unsupported scheme: {scheme}"))),
    }

    url.set_query(None);
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|_| Error::InvalidInput(format!("base url cannot have a path: {base}")))?
        .pop_if_empty()
        .extend(["character", character, realm, "summary"]);

    Ok(url)
}

fn path_segment<'a>(field: &str, value: &'a str) -> Result<&'a str, Error> {
    match value.trim() {
        "" => Err(Error::InvalidInput(format!("{field} cannot be empty"))),
        "." | ".." => Err(Error::InvalidInput(format!("{field} cannot be a dot segment: {value:?}"))),
        segment => Ok(segment),
    }
}
