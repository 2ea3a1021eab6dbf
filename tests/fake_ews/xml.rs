//! Request-introspection helpers for the fake server.
//!
//! The handlers only need a few values out of each request, so these
//! helpers pull single attributes or text nodes by local element name
//! instead of building a document model.

use quick_xml::Reader;
use quick_xml::events::Event;

/// Whether the document contains an element with this local name.
pub fn has_element(xml: &str, element: &str) -> bool {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                if e.local_name().as_ref() == element.as_bytes() {
                    return true;
                }
            }
            Ok(Event::Eof) | Err(_) => return false,
            _ => {}
        }
    }
}

/// Value of attribute `attr` on the first element with this local name.
pub fn attr_of(xml: &str, element: &str, attr: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                if e.local_name().as_ref() == element.as_bytes() {
                    for attribute in e.attributes().flatten() {
                        if attribute.key.local_name().as_ref() == attr.as_bytes() {
                            return attribute
                                .unescape_value()
                                .ok()
                                .map(std::borrow::Cow::into_owned);
                        }
                    }
                    return None;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Text content of the first element with this local name.
pub fn text_of(xml: &str, element: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == element.as_bytes() {
                    return reader
                        .read_text(e.name())
                        .ok()
                        .map(std::borrow::Cow::into_owned);
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// XML-escape a text or attribute value.
pub fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}
