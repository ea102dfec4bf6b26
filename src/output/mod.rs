//! Output formatting module for Backlog
//!
//! Renders pages of records as aligned text tables followed by a paging
//! footer, or as pretty-printed JSON for `--json`.

use crate::error::CliResult;
use backlog_db::{
    PageResult, Project, ProjectMember, ProjectMemberView, Task, TaskAttribute,
};
use serde::Serialize;

/// Maximum width for free-text columns before truncation
const MAX_TEXT_WIDTH: usize = 30;

/// Truncate a string to the specified maximum width in characters, adding
/// an ellipsis if needed.
fn truncate(s: &str, max_width: usize) -> String {
    let len = s.chars().count();
    if len <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let head: String = s.chars().take(max_width - 3).collect();
        format!("{}...", head)
    }
}

/// Format rows into an aligned table.
///
/// ```text
/// ID            Name     Perma     Order
/// ------------  -------  --------  -----
/// 3f9a0c11b2de  Alpha    AbCd1234  0
/// ```
fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect();

    let render = |cells: Vec<&str>| -> String {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!("{}\n", line.join("  ").trim_end())
    };

    let mut output = String::new();
    output.push_str(&render(headers.to_vec()));
    let separators: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&render(separators.iter().map(String::as_str).collect()));
    for row in rows {
        output.push_str(&render(row.iter().map(String::as_str).collect()));
    }
    output
}

/// Paging summary printed under every list
fn page_footer<T>(page: &PageResult<T>) -> String {
    format!(
        "Page {} of {} ({} items)",
        page.page, page.total_pages, page.total_items
    )
}

fn format_page<T>(
    page: &PageResult<T>,
    empty: &str,
    headers: &[&str],
    row: impl Fn(&T) -> Vec<String>,
) -> String {
    if page.items.is_empty() {
        return format!("{}\n{}", empty, page_footer(page));
    }
    let rows: Vec<Vec<String>> = page.items.iter().map(row).collect();
    format!("{}{}", format_table(headers, &rows), page_footer(page))
}

pub fn format_project_page(page: &PageResult<Project>) -> String {
    format_page(
        page,
        "No projects found.",
        &["ID", "Perma", "Name", "Order", "Rev"],
        |p| {
            vec![
                p.id.clone(),
                p.perma_name.clone(),
                truncate(&p.name, MAX_TEXT_WIDTH),
                p.display_order.to_string(),
                p.revision.to_string(),
            ]
        },
    )
}

pub fn format_member_page(page: &PageResult<ProjectMember>) -> String {
    format_page(
        page,
        "No members found.",
        &["ID", "User", "Type", "Rev"],
        |m| {
            vec![
                m.id.clone(),
                m.user_id.clone(),
                m.membership_type.to_string(),
                m.revision.to_string(),
            ]
        },
    )
}

pub fn format_member_view_page(page: &PageResult<ProjectMemberView>) -> String {
    format_page(
        page,
        "No members found.",
        &["ID", "User", "Name", "Email", "Type"],
        |v| {
            let email = v
                .user
                .as_ref()
                .and_then(|u| u.email.as_deref())
                .unwrap_or("-");
            vec![
                v.id.clone(),
                v.user_id.clone(),
                truncate(v.display_name(), MAX_TEXT_WIDTH),
                truncate(email, MAX_TEXT_WIDTH),
                v.membership_type.to_string(),
            ]
        },
    )
}

pub fn format_task_page(page: &PageResult<Task>) -> String {
    format_page(
        page,
        "No tasks found.",
        &["ID", "Title", "Status", "Assignee", "Rev"],
        |t| {
            vec![
                t.id.clone(),
                truncate(&t.title, MAX_TEXT_WIDTH),
                t.status_id.clone().unwrap_or_else(|| "-".to_string()),
                t.assignee_id.clone().unwrap_or_else(|| "-".to_string()),
                t.revision.to_string(),
            ]
        },
    )
}

pub fn format_attribute_table(attributes: &[TaskAttribute]) -> String {
    if attributes.is_empty() {
        return "No attributes found.".to_string();
    }
    let rows: Vec<Vec<String>> = attributes
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                truncate(&a.name, MAX_TEXT_WIDTH),
                a.display_order.to_string(),
                a.color.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    format_table(&["ID", "Name", "Order", "Color"], &rows)
        .trim_end()
        .to_string()
}

/// Multi-line detail view of one project
pub fn format_project_details(project: &Project) -> String {
    let mut lines = vec![
        format!("ID:          {}", project.id),
        format!("Perma name:  {}", project.perma_name),
        format!("Name:        {}", project.name),
        format!("Owner:       {}", project.owner_id),
    ];
    if let Some(description) = &project.description {
        lines.push(format!("Description: {}", description));
    }
    lines.push(format!("Order:       {}", project.display_order));
    lines.push(format!("Revision:    {}", project.revision));
    lines.push(format!("Created:     {}", project.created_at.to_rfc3339()));
    if let Some(updated) = project.updated_at {
        lines.push(format!("Updated:     {}", updated.to_rfc3339()));
    }
    lines.join("\n")
}

/// Pretty-printed JSON for `--json` output
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backlog_db::{AttributeKind, MembershipType, PageRequest, UserProfile};

    fn page_of<T>(items: Vec<T>, request: &PageRequest, total: u64) -> PageResult<T> {
        PageResult::new(items, request, total)
    }

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("a very long project name", 10), "a very ...");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("ééééé", 5), "ééééé");
        assert_eq!(truncate("éééééé", 5), "éé...");
    }

    #[test]
    fn test_truncate_very_short_max() {
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_format_table_aligns_columns() {
        let rows = vec![
            vec!["a".to_string(), "Alpha".to_string()],
            vec!["bbbb".to_string(), "B".to_string()],
        ];
        let table = format_table(&["ID", "Name"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID    Name");
        assert_eq!(lines[1], "----  -----");
        assert_eq!(lines[2], "a     Alpha");
        assert_eq!(lines[3], "bbbb  B");
    }

    #[test]
    fn test_empty_project_page_still_shows_footer() {
        let page = page_of(Vec::<Project>::new(), &PageRequest::default(), 0);
        assert_eq!(
            format_project_page(&page),
            "No projects found.\nPage 1 of 0 (0 items)"
        );
    }

    #[test]
    fn test_project_page_rows_and_footer() {
        let request = PageRequest::new(1, 2);
        let page = page_of(
            vec![
                Project::new("p1", "org1", "AbCd1234", "Alpha"),
                Project::new("p2", "org1", "EfGh5678", "Bravo").with_display_order(3),
            ],
            &request,
            4,
        );
        let output = format_project_page(&page);
        assert!(output.starts_with("ID  Perma     Name   Order  Rev\n"));
        assert!(output.contains("p2  EfGh5678  Bravo  3      0"));
        assert!(output.ends_with("Page 1 of 3 (4 items)"));
    }

    #[test]
    fn test_member_view_page_handles_missing_profile() {
        let request = PageRequest::default();
        let joined = ProjectMemberView::new(
            ProjectMember::new("m1", "p1", "u1", MembershipType::Manager),
            Some(UserProfile::new("u1", "Ada").with_email("ada@example.com")),
        );
        let orphan = ProjectMemberView::new(
            ProjectMember::new("m2", "p1", "u2", MembershipType::Guest),
            None,
        );
        let output = format_member_view_page(&page_of(vec![joined, orphan], &request, 2));
        assert!(output.contains("Ada"));
        assert!(output.contains("ada@example.com"));
        assert!(output.contains("m2  u2    u2    -"));
    }

    #[test]
    fn test_task_page_shows_placeholders() {
        let request = PageRequest::default();
        let page = page_of(vec![Task::new("t1", "p1", "Write docs")], &request, 1);
        let output = format_task_page(&page);
        assert!(output.contains("t1  Write docs  -       -         0"));
    }

    #[test]
    fn test_attribute_table() {
        assert_eq!(format_attribute_table(&[]), "No attributes found.");
        let table = format_attribute_table(&[TaskAttribute::new(
            "s1",
            "p1",
            AttributeKind::Status,
            "Open",
        )
        .with_color("#00ff00")]);
        assert!(table.contains("s1  Open  0      #00ff00"));
    }

    #[test]
    fn test_project_details_skips_missing_fields() {
        let details = format_project_details(&Project::new("p1", "org1", "AbCd1234", "Alpha"));
        assert!(details.contains("Perma name:  AbCd1234"));
        assert!(!details.contains("Description:"));
        assert!(!details.contains("Updated:"));
    }

    #[test]
    fn test_to_json_page() {
        let request = PageRequest::default().with_keyword("al");
        let page = page_of(vec![Project::new("p1", "org1", "AbCd1234", "Alpha")], &request, 1);
        let json: serde_json::Value = serde_json::from_str(&to_json(&page).unwrap()).unwrap();
        assert_eq!(json["total_items"], 1);
        assert_eq!(json["total_pages"], 1);
        assert_eq!(json["keyword"], "al");
        assert_eq!(json["items"][0]["perma_name"], "AbCd1234");
    }
}
