//! POX autodiscovery for the EWS endpoint
//!
//! Resolves a mailbox address to its EWS URL by posting the outlook
//! request schema to the well-known autodiscover locations. A
//! `redirectUrl` answer is followed only when redirects were allowed
//! and the target uses a secure transport scheme.

use crate::config::Credentials;
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use url::Url;

const REQUEST_SCHEMA: &str =
    "http://schemas.microsoft.com/exchange/autodiscover/outlook/requestschema/2006";
const RESPONSE_SCHEMA: &str =
    "http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a";

/// Cap on `redirectUrl` hops per candidate.
const MAX_REDIRECTS: usize = 5;

/// What one autodiscover exchange produced.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The EWS endpoint for the mailbox.
    Endpoint(String),
    /// The server wants the request re-sent elsewhere.
    Redirect(String),
}

/// Redirect targets must use a secure transport scheme.
#[must_use]
pub fn is_secure_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| parsed.scheme() == "https")
}

/// Well-known autodiscover URLs for the mailbox's domain.
pub(crate) fn candidate_urls(mailbox: &str) -> Result<Vec<String>> {
    let domain = mailbox
        .split('@')
        .nth(1)
        .filter(|domain| !domain.is_empty())
        .ok_or_else(|| Error::Connect(format!("mailbox address \"{mailbox}\" has no domain")))?;

    Ok(vec![
        format!("https://{domain}/autodiscover/autodiscover.xml"),
        format!("https://autodiscover.{domain}/autodiscover/autodiscover.xml"),
    ])
}

pub(crate) fn request_body(mailbox: &str) -> String {
    let address = quick_xml::escape::escape(mailbox);
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Autodiscover xmlns="{REQUEST_SCHEMA}">
  <Request>
    <EMailAddress>{address}</EMailAddress>
    <AcceptableResponseSchema>{RESPONSE_SCHEMA}</AcceptableResponseSchema>
  </Request>
</Autodiscover>"#
    )
}

pub(crate) fn parse_response(xml: &str) -> Result<Outcome> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut ews_url = None;
    let mut redirect_url = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = element.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"EwsUrl" | b"RedirectUrl" => {
                        let text = reader
                            .read_text(element.name())
                            .map_err(|e| Error::Parse(format!("malformed element text: {e}")))?
                            .into_owned();
                        if name == b"EwsUrl" {
                            ews_url.get_or_insert(text);
                        } else {
                            redirect_url.get_or_insert(text);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("malformed response: {e}"))),
            _ => {}
        }
    }

    if let Some(url) = ews_url {
        return Ok(Outcome::Endpoint(url));
    }
    redirect_url.map(Outcome::Redirect).ok_or_else(|| {
        Error::Parse("autodiscover response carries neither EwsUrl nor RedirectUrl".into())
    })
}

/// Resolve the EWS endpoint for a mailbox address.
///
/// Tries each well-known candidate in order and returns the first
/// endpoint found; the last failure is reported when all candidates
/// are exhausted.
pub(crate) async fn discover(
    http: &reqwest::Client,
    credentials: &Credentials,
    mailbox: &str,
    allow_redirect: bool,
) -> Result<Url> {
    let mut last_error = Error::Connect(format!("autodiscovery failed for {mailbox}"));

    for candidate in candidate_urls(mailbox)? {
        match try_candidate(http, credentials, mailbox, &candidate, allow_redirect).await {
            Ok(endpoint) => return Ok(endpoint),
            Err(err) => {
                tracing::debug!("Autodiscover candidate {} failed: {}", candidate, err);
                last_error = err;
            }
        }
    }

    Err(last_error)
}

async fn try_candidate(
    http: &reqwest::Client,
    credentials: &Credentials,
    mailbox: &str,
    candidate: &str,
    allow_redirect: bool,
) -> Result<Url> {
    let mut target = candidate.to_string();

    for _ in 0..=MAX_REDIRECTS {
        let mut request = http
            .post(&target)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(request_body(mailbox));
        if let Credentials::Basic { user, password } = credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Connect(format!("autodiscover request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connect(format!(
                "autodiscover request to {target} failed with status {status}"
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| Error::Connect(format!("autodiscover response unreadable: {e}")))?;

        match parse_response(&body).map_err(|e| Error::Connect(e.to_string()))? {
            Outcome::Endpoint(endpoint) => {
                return Url::parse(&endpoint).map_err(|e| {
                    Error::Connect(format!("autodiscover returned an invalid endpoint: {e}"))
                });
            }
            Outcome::Redirect(redirect) => {
                if !allow_redirect {
                    return Err(Error::Connect(format!(
                        "autodiscover redirect to {redirect} refused; pass --allowredirection to follow it"
                    )));
                }
                if !is_secure_url(&redirect) {
                    return Err(Error::Connect(format!(
                        "autodiscover redirect to insecure URL {redirect} refused"
                    )));
                }
                tracing::info!("Following autodiscover redirect to {}", redirect);
                target = redirect;
            }
        }
    }

    Err(Error::Connect("too many autodiscover redirects".into()))
}
