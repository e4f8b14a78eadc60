//! Jira Links: associations between Zendesk tickets and Jira issues.
//!
//! ref: https://developer.zendesk.com/api-reference/ticketing/jira/links

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::{ApiError, Result};
use crate::pagination::{add_options, Page, PageOptions, PagedResponse, Paginator, QueryOptions};
use crate::transport::{decode_json, encode_json, Transport};

const JIRA_LINKS_PATH: &str = "jira/links";

/// A link between a ticket and a Jira issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "numeric_id::deserialize")]
    pub issue_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub issue_key: String,
    #[serde(deserialize_with = "numeric_id::deserialize")]
    pub ticket_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub shared_tickets: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl JiraLink {
    pub fn new(ticket_id: i64, issue_id: i64, issue_key: impl Into<String>) -> Self {
        Self {
            ticket_id,
            issue_id,
            issue_key: issue_key.into(),
            ..Default::default()
        }
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.updated_at.as_deref())
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Ticket and issue ids arrive either as JSON integers or as numeric strings.
mod numeric_id {
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NumericIdVisitor)
    }

    struct NumericIdVisitor;

    impl<'de> Visitor<'de> for NumericIdVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("id {v} does not fit in i64")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }
    }
}

/// Options for [`JiraLinkApi::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JiraLinkListOptions {
    pub page_options: PageOptions,
}

impl From<PageOptions> for JiraLinkListOptions {
    fn from(page_options: PageOptions) -> Self {
        Self { page_options }
    }
}

impl QueryOptions for JiraLinkListOptions {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.page_options.query_pairs()
    }
}

#[derive(Deserialize)]
struct JiraLinksEnvelope {
    #[serde(alias = "links")]
    jira_links: Vec<JiraLink>,
    #[serde(flatten)]
    page: Page,
}

#[derive(Deserialize)]
struct JiraLinkEnvelope {
    #[serde(alias = "link")]
    jira_link: JiraLink,
}

/// Writable fields of a link. Server-assigned fields are never sent.
#[derive(Serialize)]
struct JiraLinkBody<'a> {
    ticket_id: i64,
    issue_id: i64,
    issue_key: &'a str,
    shared_tickets: bool,
}

#[derive(Serialize)]
struct JiraLinkPayload<'a> {
    jira_link: JiraLinkBody<'a>,
}

impl<'a> From<&'a JiraLink> for JiraLinkPayload<'a> {
    fn from(link: &'a JiraLink) -> Self {
        Self {
            jira_link: JiraLinkBody {
                ticket_id: link.ticket_id,
                issue_id: link.issue_id,
                issue_key: &link.issue_key,
                shared_tickets: link.shared_tickets,
            },
        }
    }
}

#[async_trait]
pub trait JiraLinkApi: Send + Sync {
    async fn list(
        &self,
        ctx: &CallContext,
        options: Option<&JiraLinkListOptions>,
    ) -> Result<(Vec<JiraLink>, Page)>;

    async fn get(&self, ctx: &CallContext, link_id: i64) -> Result<JiraLink>;

    async fn create(&self, ctx: &CallContext, link: &JiraLink) -> Result<JiraLink>;

    async fn update(&self, ctx: &CallContext, link_id: i64, link: &JiraLink) -> Result<JiraLink>;

    async fn delete(&self, ctx: &CallContext, link_id: i64) -> Result<()>;
}

/// Jira Links accessors over an injected [`Transport`].
pub struct JiraLinks<'a, T: Transport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> Clone for JiraLinks<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Transport + ?Sized> Copy for JiraLinks<'a, T> {}

impl<'a, T: Transport + ?Sized> JiraLinks<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Page-by-page iteration over every link, each request bound to `ctx`.
    pub fn pages(&self, ctx: &CallContext) -> JiraLinkPages<'a, T> {
        JiraLinkPages {
            links: *self,
            ctx: ctx.clone(),
        }
    }

    fn link_path(link_id: i64) -> String {
        format!("{JIRA_LINKS_PATH}/{link_id}")
    }

    async fn send_single(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        link: Option<&JiraLink>,
    ) -> Result<JiraLink> {
        let body = link
            .map(|link| encode_json(&JiraLinkPayload::from(link)))
            .transpose()?;
        let raw = self.transport.send(ctx, method, path, body.as_ref()).await?;
        let envelope: JiraLinkEnvelope = decode_json(&raw)?;
        Ok(envelope.jira_link)
    }
}

#[async_trait]
impl<'a, T: Transport + ?Sized> JiraLinkApi for JiraLinks<'a, T> {
    async fn list(
        &self,
        ctx: &CallContext,
        options: Option<&JiraLinkListOptions>,
    ) -> Result<(Vec<JiraLink>, Page)> {
        let options = options.ok_or_else(|| {
            ApiError::InvalidOptions("list options are required for jira links".to_string())
        })?;

        let path = add_options(JIRA_LINKS_PATH, options);
        let raw = self.transport.send(ctx, Method::GET, &path, None).await?;
        let envelope: JiraLinksEnvelope = decode_json(&raw)?;

        Ok((envelope.jira_links, envelope.page))
    }

    async fn get(&self, ctx: &CallContext, link_id: i64) -> Result<JiraLink> {
        self.send_single(ctx, Method::GET, &Self::link_path(link_id), None)
            .await
    }

    async fn create(&self, ctx: &CallContext, link: &JiraLink) -> Result<JiraLink> {
        self.send_single(ctx, Method::POST, JIRA_LINKS_PATH, Some(link))
            .await
    }

    async fn update(&self, ctx: &CallContext, link_id: i64, link: &JiraLink) -> Result<JiraLink> {
        self.send_single(ctx, Method::PUT, &Self::link_path(link_id), Some(link))
            .await
    }

    async fn delete(&self, ctx: &CallContext, link_id: i64) -> Result<()> {
        self.transport
            .send(ctx, Method::DELETE, &Self::link_path(link_id), None)
            .await?;
        Ok(())
    }
}

/// [`Paginator`] over the Jira Links list endpoint.
pub struct JiraLinkPages<'a, T: Transport + ?Sized> {
    links: JiraLinks<'a, T>,
    ctx: CallContext,
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Paginator<JiraLink> for JiraLinkPages<'a, T> {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<PagedResponse<JiraLink>> {
        let options = JiraLinkListOptions::from(
            PageOptions::new().with_page(page).with_per_page(per_page),
        );
        let (items, page) = self.links.list(&self.ctx, Some(&options)).await?;
        Ok(PagedResponse { items, page })
    }
}
