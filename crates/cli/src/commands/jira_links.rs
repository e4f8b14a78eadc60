use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use zendesk_api::pagination::{collect_pages, Paginator};
use zendesk_api::{
    CallContext, JiraLink, JiraLinkApi, JiraLinkListOptions, JiraLinks, PageOptions, Transport,
};
use zendesk_output::OutputRenderer;

const DEFAULT_PER_PAGE: u32 = 100;

#[derive(Args, Debug, Clone)]
pub struct JiraLinksArgs {
    #[command(subcommand)]
    command: JiraLinksCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum JiraLinksCommand {
    /// List links between tickets and Jira issues
    List {
        /// Results per page
        #[arg(long)]
        per_page: Option<u32>,
        /// Page number to fetch
        #[arg(long, conflicts_with = "all")]
        page: Option<u32>,
        /// Follow next_page until every link is fetched
        #[arg(long)]
        all: bool,
        /// Stop after this many links (with --all)
        #[arg(long, requires = "all")]
        limit: Option<usize>,
    },

    /// Fetch a single link
    Get {
        /// Link ID
        id: i64,
    },

    /// Link a ticket to a Jira issue
    Create {
        #[command(flatten)]
        fields: LinkFields,
    },

    /// Replace the fields of an existing link
    Update {
        /// Link ID
        id: i64,
        #[command(flatten)]
        fields: LinkFields,
    },

    /// Delete a link
    Delete {
        /// Link ID
        id: i64,
    },
}

#[derive(Args, Debug, Clone)]
struct LinkFields {
    /// Zendesk ticket ID
    #[arg(long)]
    ticket_id: i64,
    /// Jira issue ID
    #[arg(long)]
    issue_id: i64,
    /// Jira issue key (e.g. PROJ-123)
    #[arg(long)]
    issue_key: String,
    /// Share the linked ticket's comments with Jira
    #[arg(long)]
    shared_tickets: bool,
}

impl From<LinkFields> for JiraLink {
    fn from(fields: LinkFields) -> Self {
        JiraLink {
            shared_tickets: fields.shared_tickets,
            ..JiraLink::new(fields.ticket_id, fields.issue_id, fields.issue_key)
        }
    }
}

pub async fn execute<T: Transport + ?Sized>(
    args: JiraLinksArgs,
    links: JiraLinks<'_, T>,
    ctx: &CallContext,
    renderer: &OutputRenderer,
) -> Result<()> {
    match args.command {
        JiraLinksCommand::List {
            per_page,
            page,
            all,
            limit,
        } => {
            if all {
                let pages = links.pages(ctx);
                let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
                let items = match limit {
                    Some(_) => collect_pages(&pages, per_page, limit).await,
                    None => pages.fetch_all(per_page).await,
                }
                .context("Failed to list jira links")?;
                tracing::debug!(count = items.len(), "Fetched all jira links");
                return renderer.render(&items);
            }

            let options = JiraLinkListOptions::from(PageOptions { per_page, page });
            let (items, page) = links
                .list(ctx, Some(&options))
                .await
                .context("Failed to list jira links")?;

            renderer.render(&items)?;
            if page.has_next() {
                tracing::info!(
                    next_page = page.next_page_number(),
                    total = page.count,
                    "More links available, use --page or --all"
                );
            }
            Ok(())
        }
        JiraLinksCommand::Get { id } => {
            let link = links
                .get(ctx, id)
                .await
                .with_context(|| format!("Failed to get jira link {id}"))?;
            renderer.render(&link)
        }
        JiraLinksCommand::Create { fields } => {
            let link = links
                .create(ctx, &JiraLink::from(fields))
                .await
                .context("Failed to create jira link")?;

            tracing::info!(id = ?link.id, issue_key = %link.issue_key, "Jira link created");
            renderer.render(&link)
        }
        JiraLinksCommand::Update { id, fields } => {
            let link = links
                .update(ctx, id, &JiraLink::from(fields))
                .await
                .with_context(|| format!("Failed to update jira link {id}"))?;
            renderer.render(&link)
        }
        JiraLinksCommand::Delete { id } => {
            links
                .delete(ctx, id)
                .await
                .with_context(|| format!("Failed to delete jira link {id}"))?;

            tracing::info!(id, "Jira link deleted");
            Ok(())
        }
    }
}
