//! EWS SOAP response parsing
//!
//! Responses are read with quick-xml's event API, keyed on local
//! element names so namespace prefixes don't matter. An `Error`
//! response class surfaces as a parse error carrying the server's
//! message text; the caller maps it to the failing operation.

use crate::error::{Error, Result};
use crate::folder::{FolderId, FolderRef};
use crate::item::{
    ExtendedProperty, FOLDER_PATH_TAG, Item, ItemId, ItemKind, PropertyDefinition, PropertyType,
    Sensitivity,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// One page of search results plus the paging signal.
#[derive(Debug)]
pub(crate) struct Page<T> {
    pub entries: Vec<T>,
    /// More pages remain after this one.
    pub more_available: bool,
}

fn reader_for(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attr(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attribute| attribute.key.local_name().as_ref() == name.as_bytes())
        .and_then(|attribute| attribute.unescape_value().ok())
        .map(std::borrow::Cow::into_owned)
}

fn read_text(reader: &mut Reader<&[u8]>, element: &BytesStart<'_>) -> Result<String> {
    let raw = reader
        .read_text(element.name())
        .map_err(|e| Error::Parse(format!("malformed element text: {e}")))?;
    quick_xml::escape::unescape(&raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| Error::Parse(format!("malformed element text: {e}")))
}

/// `PropertyTag="0x36"` and friends.
fn parse_tag(raw: &str) -> Option<u16> {
    let digits = raw.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).ok()
}

fn property_definition(element: &BytesStart<'_>) -> Option<PropertyDefinition> {
    let tag = parse_tag(&attr(element, "PropertyTag")?)?;
    let kind = PropertyType::parse(&attr(element, "PropertyType")?)?;
    Some(PropertyDefinition { tag, kind })
}

fn is_error_response_message(name: &str, element: &BytesStart<'_>) -> bool {
    name.ends_with("ResponseMessage") && attr(element, "ResponseClass").as_deref() == Some("Error")
}

/// Paging signal from the `RootFolder` element: more pages remain while
/// the server has not yet included the last item in range.
fn more_available(element: &BytesStart<'_>) -> bool {
    attr(element, "IncludesLastItemInRange").as_deref() == Some("false")
}

fn error_response() -> Error {
    Error::Parse("server reported an error response".into())
}

struct PartialFolder {
    id: Option<FolderId>,
    display_name: String,
    total_count: u32,
}

pub(crate) fn parse_find_folder(xml: &str) -> Result<Page<FolderRef>> {
    let mut reader = reader_for(xml);
    let mut entries = Vec::new();
    let mut more = false;
    let mut error_class = false;
    let mut current: Option<PartialFolder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = local_name(&element);
                match name.as_str() {
                    "RootFolder" => more = more_available(&element),
                    "Folder" => {
                        current = Some(PartialFolder {
                            id: None,
                            display_name: String::new(),
                            total_count: 0,
                        });
                    }
                    "FolderId" => capture_folder_id(&element, current.as_mut()),
                    "DisplayName" => {
                        let text = read_text(&mut reader, &element)?;
                        if let Some(folder) = current.as_mut() {
                            folder.display_name = text;
                        }
                    }
                    "TotalCount" => {
                        let text = read_text(&mut reader, &element)?;
                        if let Some(folder) = current.as_mut() {
                            folder.total_count = text.parse().unwrap_or(0);
                        }
                    }
                    "MessageText" => {
                        let text = read_text(&mut reader, &element)?;
                        if error_class {
                            return Err(Error::Parse(text));
                        }
                    }
                    _ => {
                        if is_error_response_message(&name, &element) {
                            error_class = true;
                        }
                    }
                }
            }
            Ok(Event::Empty(element)) => {
                let name = local_name(&element);
                match name.as_str() {
                    "RootFolder" => more = more_available(&element),
                    "FolderId" => capture_folder_id(&element, current.as_mut()),
                    _ => {
                        if is_error_response_message(&name, &element) {
                            error_class = true;
                        }
                    }
                }
            }
            Ok(Event::End(element)) => {
                if element.local_name().as_ref() == b"Folder" {
                    if let Some(folder) = current.take() {
                        let id = folder
                            .id
                            .ok_or_else(|| Error::Parse("folder entry without FolderId".into()))?;
                        entries.push(FolderRef {
                            id,
                            display_name: folder.display_name,
                            total_count: folder.total_count,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("malformed response: {e}"))),
            _ => {}
        }
    }

    if error_class {
        return Err(error_response());
    }
    Ok(Page {
        entries,
        more_available: more,
    })
}

fn capture_folder_id(element: &BytesStart<'_>, current: Option<&mut PartialFolder>) {
    if let (Some(folder), Some(id)) = (current, attr(element, "Id")) {
        folder.id = Some(FolderId {
            id,
            change_key: attr(element, "ChangeKey"),
        });
    }
}

struct PartialItem {
    element: String,
    kind: ItemKind,
    id: Option<ItemId>,
    subject: String,
    sensitivity: Sensitivity,
    properties: Vec<ExtendedProperty>,
}

pub(crate) fn parse_find_item(xml: &str) -> Result<Page<Item>> {
    let mut reader = reader_for(xml);
    let mut entries = Vec::new();
    let mut more = false;
    let mut error_class = false;
    let mut in_items = false;
    let mut current: Option<PartialItem> = None;
    let mut pending_definition: Option<PropertyDefinition> = None;
    let mut pending_value: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = local_name(&element);

                // A direct child of <Items> opens a new item; its element
                // name decides the kind.
                if in_items && current.is_none() {
                    let kind = if name == "Message" {
                        ItemKind::Message
                    } else {
                        ItemKind::Other
                    };
                    current = Some(PartialItem {
                        element: name,
                        kind,
                        id: None,
                        subject: String::new(),
                        sensitivity: Sensitivity::Normal,
                        properties: Vec::new(),
                    });
                    continue;
                }

                match name.as_str() {
                    "RootFolder" => more = more_available(&element),
                    "Items" => in_items = true,
                    "ItemId" => capture_item_id(&element, current.as_mut()),
                    "Subject" => {
                        let text = read_text(&mut reader, &element)?;
                        if let Some(item) = current.as_mut() {
                            item.subject = text;
                        }
                    }
                    "Sensitivity" => {
                        let text = read_text(&mut reader, &element)?;
                        if let Some(item) = current.as_mut() {
                            item.sensitivity =
                                Sensitivity::parse(&text).unwrap_or(Sensitivity::Normal);
                        }
                    }
                    "ExtendedFieldURI" => pending_definition = property_definition(&element),
                    "Value" => pending_value = Some(read_text(&mut reader, &element)?),
                    "MessageText" => {
                        let text = read_text(&mut reader, &element)?;
                        if error_class {
                            return Err(Error::Parse(text));
                        }
                    }
                    _ => {
                        if is_error_response_message(&name, &element) {
                            error_class = true;
                        }
                    }
                }
            }
            Ok(Event::Empty(element)) => {
                let name = local_name(&element);
                match name.as_str() {
                    "RootFolder" => more = more_available(&element),
                    "ItemId" => capture_item_id(&element, current.as_mut()),
                    "ExtendedFieldURI" => pending_definition = property_definition(&element),
                    _ => {
                        if is_error_response_message(&name, &element) {
                            error_class = true;
                        }
                    }
                }
            }
            Ok(Event::End(element)) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                if name == "Items" {
                    in_items = false;
                } else if name == "ExtendedProperty" {
                    if let (Some(item), Some(definition), Some(value)) =
                        (current.as_mut(), pending_definition.take(), pending_value.take())
                    {
                        item.properties.push(ExtendedProperty { definition, value });
                    }
                } else if current.as_ref().is_some_and(|item| item.element == name) {
                    if let Some(item) = current.take() {
                        let id = item
                            .id
                            .ok_or_else(|| Error::Parse("item entry without ItemId".into()))?;
                        entries.push(Item {
                            id,
                            kind: item.kind,
                            subject: item.subject,
                            sensitivity: item.sensitivity,
                            extended_properties: item.properties,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("malformed response: {e}"))),
            _ => {}
        }
    }

    if error_class {
        return Err(error_response());
    }
    Ok(Page {
        entries,
        more_available: more,
    })
}

fn capture_item_id(element: &BytesStart<'_>, current: Option<&mut PartialItem>) {
    if let (Some(item), Some(id)) = (current, attr(element, "Id")) {
        item.id = Some(ItemId {
            id,
            change_key: attr(element, "ChangeKey"),
        });
    }
}

/// Raw value of the folder path extended property, if the response
/// carries one. Normalization is left to the caller.
pub(crate) fn parse_get_folder_path(xml: &str) -> Result<Option<String>> {
    let mut reader = reader_for(xml);
    let mut error_class = false;
    let mut pending_definition: Option<PropertyDefinition> = None;
    let mut path = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = local_name(&element);
                match name.as_str() {
                    "ExtendedFieldURI" => pending_definition = property_definition(&element),
                    "Value" => {
                        let text = read_text(&mut reader, &element)?;
                        if pending_definition.is_some_and(|d| d.tag == FOLDER_PATH_TAG) {
                            path = Some(text);
                        }
                    }
                    "MessageText" => {
                        let text = read_text(&mut reader, &element)?;
                        if error_class {
                            return Err(Error::Parse(text));
                        }
                    }
                    _ => {
                        if is_error_response_message(&name, &element) {
                            error_class = true;
                        }
                    }
                }
            }
            Ok(Event::Empty(element)) => {
                let name = local_name(&element);
                if name == "ExtendedFieldURI" {
                    pending_definition = property_definition(&element);
                } else if is_error_response_message(&name, &element) {
                    error_class = true;
                }
            }
            Ok(Event::End(element)) => {
                if element.local_name().as_ref() == b"ExtendedProperty" {
                    pending_definition = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("malformed response: {e}"))),
            _ => {}
        }
    }

    if error_class {
        return Err(error_response());
    }
    Ok(path)
}

/// Success/failure of an UpdateItem call.
pub(crate) fn parse_update_item(xml: &str) -> Result<()> {
    let mut reader = reader_for(xml);
    let mut error_class = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = local_name(&element);
                if name == "MessageText" {
                    let text = read_text(&mut reader, &element)?;
                    if error_class {
                        return Err(Error::Parse(text));
                    }
                } else if is_error_response_message(&name, &element) {
                    error_class = true;
                }
            }
            Ok(Event::Empty(element)) => {
                let name = local_name(&element);
                if is_error_response_message(&name, &element) {
                    error_class = true;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("malformed response: {e}"))),
            _ => {}
        }
    }

    if error_class {
        return Err(error_response());
    }
    Ok(())
}
