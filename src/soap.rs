//! EWS SOAP request envelopes
//!
//! The five operations this tool issues have fixed shapes, so requests
//! are built from `format!` templates rather than a serializer; the
//! wire format stays visible in one place. Every interpolated value
//! passes through [`escape`].

use crate::filter::ItemFilter;
use crate::folder::FolderId;
use crate::item::{ItemId, PropertyDefinition, Sensitivity};

/// Page size for folder and item searches.
pub(crate) const PAGE_SIZE: usize = 100;

const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const TYPES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
const MESSAGES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";

/// XML-escape an attribute or text value.
fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

fn envelope(impersonate: Option<&str>, body: &str) -> String {
    let impersonation = impersonate.map_or_else(String::new, |smtp| {
        format!(
            "<t:ExchangeImpersonation><t:ConnectingSID><t:SmtpAddress>{}</t:SmtpAddress></t:ConnectingSID></t:ExchangeImpersonation>",
            escape(smtp)
        )
    });

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="{SOAP_NS}" xmlns:t="{TYPES_NS}" xmlns:m="{MESSAGES_NS}">
  <soap:Header>
    <t:RequestServerVersion Version="Exchange2013_SP1"/>{impersonation}
  </soap:Header>
  <soap:Body>
{body}
  </soap:Body>
</soap:Envelope>"#
    )
}

fn extended_field_uri(definition: PropertyDefinition) -> String {
    format!(
        r#"<t:ExtendedFieldURI PropertyTag="{}" PropertyType="{}"/>"#,
        definition.tag_hex(),
        definition.kind.as_str()
    )
}

fn folder_id_xml(folder: &FolderId) -> String {
    folder.change_key.as_ref().map_or_else(
        || format!(r#"<t:FolderId Id="{}"/>"#, escape(&folder.id)),
        |change_key| {
            format!(
                r#"<t:FolderId Id="{}" ChangeKey="{}"/>"#,
                escape(&folder.id),
                escape(change_key)
            )
        },
    )
}

fn item_id_xml(item: &ItemId) -> String {
    item.change_key.as_ref().map_or_else(
        || format!(r#"<t:ItemId Id="{}"/>"#, escape(&item.id)),
        |change_key| {
            format!(
                r#"<t:ItemId Id="{}" ChangeKey="{}"/>"#,
                escape(&item.id),
                escape(change_key)
            )
        },
    )
}

/// Deep folder search under the mailbox's message root for folders
/// holding at least one item, requesting identifier and display name
/// only.
pub(crate) fn find_folder(mailbox: &str, impersonate: Option<&str>, offset: usize) -> String {
    let body = format!(
        r#"    <m:FindFolder Traversal="Deep">
      <m:FolderShape>
        <t:BaseShape>IdOnly</t:BaseShape>
        <t:AdditionalProperties>
          <t:FieldURI FieldURI="folder:DisplayName"/>
          <t:FieldURI FieldURI="folder:TotalCount"/>
        </t:AdditionalProperties>
      </m:FolderShape>
      <m:IndexedPageFolderView MaxEntriesReturned="{PAGE_SIZE}" Offset="{offset}" BasePoint="Beginning"/>
      <m:Restriction>
        <t:IsGreaterThan>
          <t:FieldURI FieldURI="folder:TotalCount"/>
          <t:FieldURIOrConstant><t:Constant Value="0"/></t:FieldURIOrConstant>
        </t:IsGreaterThan>
      </m:Restriction>
      <m:ParentFolderIds>
        <t:DistinguishedFolderId Id="msgfolderroot">
          <t:Mailbox><t:EmailAddress>{mailbox}</t:EmailAddress></t:Mailbox>
        </t:DistinguishedFolderId>
      </m:ParentFolderIds>
    </m:FindFolder>"#,
        mailbox = escape(mailbox)
    );
    envelope(impersonate, &body)
}

fn restriction(filter: &ItemFilter) -> String {
    match filter {
        ItemFilter::PrivateFlag => r#"<t:IsEqualTo>
          <t:FieldURI FieldURI="item:Sensitivity"/>
          <t:FieldURIOrConstant><t:Constant Value="Private"/></t:FieldURIOrConstant>
        </t:IsEqualTo>"#
            .to_string(),
        ItemFilter::SubjectContains(text) => format!(
            r#"<t:Contains ContainmentMode="Substring" ContainmentComparison="IgnoreCase">
          <t:FieldURI FieldURI="item:Subject"/>
          <t:Constant Value="{}"/>
        </t:Contains>"#,
            escape(text)
        ),
    }
}

/// Shallow item search within one folder, requesting subject,
/// sensitivity and the sensitivity extended property.
pub(crate) fn find_item(
    folder: &FolderId,
    filter: &ItemFilter,
    impersonate: Option<&str>,
    offset: usize,
) -> String {
    let body = format!(
        r#"    <m:FindItem Traversal="Shallow">
      <m:ItemShape>
        <t:BaseShape>IdOnly</t:BaseShape>
        <t:AdditionalProperties>
          <t:FieldURI FieldURI="item:Subject"/>
          <t:FieldURI FieldURI="item:Sensitivity"/>
          {sensitivity_property}
        </t:AdditionalProperties>
      </m:ItemShape>
      <m:IndexedPageItemView MaxEntriesReturned="{PAGE_SIZE}" Offset="{offset}" BasePoint="Beginning"/>
      <m:Restriction>
        {restriction}
      </m:Restriction>
      <m:ParentFolderIds>
        {folder_id}
      </m:ParentFolderIds>
    </m:FindItem>"#,
        sensitivity_property = extended_field_uri(PropertyDefinition::SENSITIVITY),
        restriction = restriction(filter),
        folder_id = folder_id_xml(folder)
    );
    envelope(impersonate, &body)
}

/// Rebind to a single folder to fetch the full-path extended property.
pub(crate) fn get_folder(folder: &FolderId, impersonate: Option<&str>) -> String {
    let body = format!(
        r#"    <m:GetFolder>
      <m:FolderShape>
        <t:BaseShape>AllProperties</t:BaseShape>
        <t:AdditionalProperties>
          {path_property}
        </t:AdditionalProperties>
      </m:FolderShape>
      <m:FolderIds>
        {folder_id}
      </m:FolderIds>
    </m:GetFolder>"#,
        path_property = extended_field_uri(PropertyDefinition::FOLDER_PATH),
        folder_id = folder_id_xml(folder)
    );
    envelope(impersonate, &body)
}

/// Overwrite the sensitivity extended property on one item.
///
/// The conflict resolution is last-writer-wins; there is no
/// optimistic-concurrency check.
pub(crate) fn update_item(item: &ItemId, target: Sensitivity, impersonate: Option<&str>) -> String {
    let body = format!(
        r#"    <m:UpdateItem ConflictResolution="AlwaysOverwrite" MessageDisposition="SaveOnly">
      <m:ItemChanges>
        <t:ItemChange>
          {item_id}
          <t:Updates>
            <t:SetItemField>
              {sensitivity_property}
              <t:Message>
                <t:ExtendedProperty>
                  {sensitivity_property}
                  <t:Value>{value}</t:Value>
                </t:ExtendedProperty>
              </t:Message>
            </t:SetItemField>
          </t:Updates>
        </t:ItemChange>
      </m:ItemChanges>
    </m:UpdateItem>"#,
        item_id = item_id_xml(item),
        sensitivity_property = extended_field_uri(PropertyDefinition::SENSITIVITY),
        value = target.mapi_value()
    );
    envelope(impersonate, &body)
}
