pub mod jira_links;
