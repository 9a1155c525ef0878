//! Plain-text rendering of command output.

use shepherd_core::attendance::AttendanceMetrics;
use shepherd_core::models::{
    AttendanceSummary, Church, ChurchEvent, HomeGroup, Meeting, MeetingAttendance, Page, Person,
    Worship,
};
use shepherd_core::roles::RoleTree;
use shepherd_core::utils::{cmp_ignore_case, truncate};

const NAME_WIDTH: usize = 28;

pub fn role_tree(tree: &RoleTree) -> String {
    if tree.is_empty() {
        return format!("Strategy {} has no roles yet.\n", tree.strategy_id);
    }
    let mut out = format!(
        "Strategy {}: {} roles, {} assignments\n",
        tree.strategy_id,
        tree.total_roles(),
        tree.total_people()
    );
    tree.walk(|node, depth| {
        let indent = "  ".repeat(depth);
        let below = node.count_people_in_tree() - node.people.len();
        out.push_str(&format!("{}- {} [#{}]", indent, node.name, node.id));
        if below > 0 {
            out.push_str(&format!(" ({} more below)", below));
        }
        out.push('\n');
        let mut people: Vec<&Person> = node.people.iter().collect();
        people.sort_by(|a, b| cmp_ignore_case(&a.sort_name(), &b.sort_name()));
        for p in people {
            out.push_str(&format!("{}    * {} (#{})\n", indent, p.full_name(), p.id));
        }
    });
    out
}

pub fn attendance_page(page: &Page<MeetingAttendance>) -> String {
    let mut out = String::new();
    for record in &page.content {
        out.push_str(&format!(
            "{:>6}  {:<width$}  {:<16}  {}\n",
            record.person.id,
            truncate(&record.person.full_name(), NAME_WIDTH),
            record.person.display_phone(),
            record.status,
            width = NAME_WIDTH,
        ));
    }
    let present = page.content.iter().filter(|r| r.status.is_present()).count();
    out.push_str(&format!(
        "{} present on this page, {} records total ({})\n",
        present,
        page.total_elements,
        page.position_display()
    ));
    out
}

pub fn summary(meeting_id: i64, summary: &AttendanceSummary) -> String {
    format!(
        "Meeting {}: {} present, {} absent, {} recorded\n",
        meeting_id,
        summary.present,
        summary.absent,
        summary.total()
    )
}

pub fn metrics(rows: &[(Meeting, AttendanceSummary)], metrics: &AttendanceMetrics) -> String {
    let mut out = String::new();
    for (meeting, s) in rows {
        out.push_str(&format!(
            "{:<40} {:>4} present {:>4} absent\n",
            truncate(&meeting.display_title(), 40),
            s.present,
            s.absent
        ));
    }
    let average = metrics
        .average_present()
        .map(|a| format!("{:.1}", a))
        .unwrap_or_else(|| "-".to_string());
    out.push_str(&format!(
        "{} meetings, attendance rate {}, average {} present\n",
        metrics.meetings,
        metrics.rate_display(),
        average
    ));
    out
}

pub fn groups<'a>(groups: impl IntoIterator<Item = &'a HomeGroup>) -> String {
    let mut out = String::new();
    for g in groups {
        out.push_str(&format!(
            "{:>6}  {:<width$}  {}\n",
            g.id,
            truncate(&g.name, NAME_WIDTH),
            g.leader_name(),
            width = NAME_WIDTH,
        ));
    }
    if out.is_empty() {
        out.push_str("No groups found.\n");
    }
    out
}

pub fn group_detail(group: &HomeGroup) -> String {
    let mut out = format!("{} [#{}]\n", group.name, group.id);
    if let Some(ref d) = group.description {
        out.push_str(&format!("  {}\n", d));
    }
    out.push_str(&format!("  Leader:   {}\n", group.leader_name()));
    if let Some((lat, lon)) = group.coordinates() {
        out.push_str(&format!("  Location: {:.5}, {:.5}\n", lat, lon));
    }
    if let Some(ref s) = group.strategy {
        out.push_str(&format!("  Strategy: {} [#{}]\n", s.name, s.id));
    }
    out
}

pub fn people(people: &[Person]) -> String {
    let mut out = String::new();
    for p in people {
        out.push_str(&format!(
            "{:>6}  {:<width$}  {}\n",
            p.id,
            truncate(&p.full_name(), NAME_WIDTH),
            p.display_phone(),
            width = NAME_WIDTH,
        ));
    }
    out
}

pub fn churches(churches: &[Church]) -> String {
    churches
        .iter()
        .map(|c| format!("{:>6}  {:<width$}  {}\n", c.id, truncate(&c.name, NAME_WIDTH), c.location_display(), width = NAME_WIDTH))
        .collect()
}

pub fn worships(worships: &[Worship]) -> String {
    worships
        .iter()
        .map(|w| format!("{:>6}  {:<width$}  {}\n", w.id, truncate(&w.name, NAME_WIDTH), w.starts_display(), width = NAME_WIDTH))
        .collect()
}

pub fn events(events: &[ChurchEvent]) -> String {
    events
        .iter()
        .map(|e| format!("{:>6}  {:<width$}  {}\n", e.id, truncate(&e.name, NAME_WIDTH), e.date_range_display(), width = NAME_WIDTH))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_core::models::{AttendanceStatus, RoleStrategyNode};

    fn person(id: i64, first: &str, last: &str) -> Person {
        Person {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: None,
            avatar: None,
        }
    }

    #[test]
    fn test_role_tree_rendering() {
        let mut pastor = RoleStrategyNode::new(1, "Pastor", None);
        pastor.people.push(person(10, "Ana", "Zanon"));
        let mut leader = RoleStrategyNode::new(2, "Leader", Some(1));
        leader.people.push(person(12, "Bia", "Costa"));
        leader.people.push(person(11, "Caio", "Alves"));
        pastor.children.push(leader);
        let tree = RoleTree::from_nodes(4, vec![pastor]).expect("tree");

        let expected = "\
Strategy 4: 2 roles, 3 assignments
- Pastor [#1] (2 more below)
    * Ana Zanon (#10)
  - Leader [#2]
      * Caio Alves (#11)
      * Bia Costa (#12)
";
        assert_eq!(role_tree(&tree), expected);
    }

    #[test]
    fn test_empty_role_tree_rendering() {
        assert_eq!(role_tree(&RoleTree::empty(9)), "Strategy 9 has no roles yet.\n");
    }

    #[test]
    fn test_attendance_footer() {
        let page = Page {
            content: vec![
                MeetingAttendance {
                    person: person(1, "Ana", "Reis"),
                    status: AttendanceStatus::Present,
                },
                MeetingAttendance {
                    person: person(2, "Rui", "Reis"),
                    status: AttendanceStatus::Absent,
                },
            ],
            total_elements: 12,
            total_pages: 2,
            number: 0,
            size: 10,
        };
        let text = attendance_page(&page);
        assert!(text.contains("Present"));
        assert!(text.ends_with("1 present on this page, 12 records total (page 1 of 2)\n"));
    }

    #[test]
    fn test_empty_groups() {
        assert_eq!(groups(&Vec::<HomeGroup>::new()), "No groups found.\n");
    }
}
