//! Command handlers.

use anyhow::{bail, Result};
use shepherd_core::api::is_unauthorized;
use shepherd_core::attendance::{AttendanceMetrics, AttendanceQuery, AttendanceService, MeetingRef};
use shepherd_core::cache::CachedData;
use shepherd_core::groups::{Debouncer, GeoBounds, MAP_BOUNDS_DEBOUNCE};
use shepherd_core::roles::RoleEditor;
use shepherd_core::ApiClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::app::{confirm, App};
use crate::cli::{AttendanceCommand, Command, GroupsCommand, Paging, RolesCommand};
use crate::render;

/// Page size used while looking a person up in a meeting's attendance.
const LOOKUP_PAGE_SIZE: u32 = 50;

pub async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => {
            app.login(username).await?;
            println!("Signed in.");
            Ok(())
        }
        Command::Logout => {
            app.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Groups(cmd) => groups(app, cmd).await,
        Command::Roles(cmd) => roles(app, cmd).await,
        Command::Attendance(cmd) => attendance(app, cmd).await,
        Command::People { search, paging } => people(app, search, paging).await,
        Command::Churches { paging } => {
            if app.offline {
                return print_cached("churches", app.cache.load_churches()?, render::churches);
            }
            let page = app.client().await?.fetch_churches(paging.page, paging.size).await?;
            save_or_warn("churches", app.cache.save_churches(&page.content));
            print!("{}", render::churches(&page.content));
            Ok(())
        }
        Command::Worships { church, paging } => {
            if app.offline {
                let cached = app.cache.load_worships()?.map(|c| CachedData {
                    data: c
                        .data
                        .into_iter()
                        .filter(|w| church.is_none() || w.church_id == church)
                        .collect(),
                    cached_at: c.cached_at,
                });
                return print_cached("worships", cached, render::worships);
            }
            let church = church.or(app.config.church_id);
            let page = app
                .client()
                .await?
                .fetch_worships(church, paging.page, paging.size)
                .await?;
            save_or_warn("worships", app.cache.save_worships(&page.content));
            print!("{}", render::worships(&page.content));
            Ok(())
        }
        Command::Events { paging } => {
            if app.offline {
                return print_cached("events", app.cache.load_events()?, render::events);
            }
            let page = app.client().await?.fetch_events(paging.page, paging.size).await?;
            save_or_warn("events", app.cache.save_events(&page.content));
            print!("{}", render::events(&page.content));
            Ok(())
        }
        Command::Cache => {
            for (name, age) in app.cache.get_cache_ages().rows() {
                println!("{:<10} {}", name, age);
            }
            if app.cache.any_stale() {
                println!("Some data is stale; run a command without --offline to refresh it.");
            }
            Ok(())
        }
    }
}

async fn groups(app: &mut App, cmd: GroupsCommand) -> Result<()> {
    match cmd {
        GroupsCommand::List { paging } => {
            if app.offline {
                return print_cached("groups", app.cache.load_groups()?, |g| render::groups(g));
            }
            let page = app.client().await?.fetch_groups(paging.page, paging.size).await?;
            save_or_warn("groups", app.cache.save_groups(&page.content));
            print!("{}", render::groups(&page.content));
            println!("({})", page.position_display());
            Ok(())
        }
        GroupsCommand::Show { group } => {
            let found = if app.offline {
                app.cache
                    .load_groups()?
                    .and_then(|c| c.data.into_iter().find(|g| g.id == group))
            } else {
                Some(app.client().await?.fetch_group(group).await?)
            };
            match found {
                Some(g) => print!("{}", render::group_detail(&g)),
                None => bail!("Group {} is not in the local cache", group),
            }
            Ok(())
        }
        GroupsCommand::Near {
            latitude,
            longitude,
            radius,
        } => {
            let bounds = GeoBounds::around(latitude, longitude, radius);
            if app.offline {
                let cached = app.cache.load_groups()?;
                return print_cached("groups", cached, |g| render::groups(bounds.filter(g)));
            }
            let groups = app.client().await?.fetch_groups_in_bounds(&bounds).await?;
            print!("{}", render::groups(&groups));
            Ok(())
        }
        GroupsCommand::Watch => {
            let client = app.client().await?;
            watch_groups(client).await
        }
    }
}

/// Query groups for each viewport read from stdin, debounced so a burst of
/// pans only triggers one request.
async fn watch_groups(client: ApiClient) -> Result<()> {
    let (debouncer, mut bounds_rx) = Debouncer::new(MAP_BOUNDS_DEBOUNCE);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_bounds(&line) {
                Some(bounds) => {
                    if !debouncer.push(bounds).await {
                        break;
                    }
                }
                None => eprintln!("Expected four numbers: north south east west"),
            }
        }
    });

    while let Some(bounds) = bounds_rx.recv().await {
        match client.fetch_groups_in_bounds(&bounds).await {
            Ok(groups) => print!("{}", render::groups(&groups)),
            Err(e) if is_unauthorized(&e) => return Err(e),
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }
    reader.await?;
    Ok(())
}

fn parse_bounds(line: &str) -> Option<GeoBounds> {
    let values: Vec<f64> = line
        .split_whitespace()
        .map(|v| v.parse().ok())
        .collect::<Option<Vec<f64>>>()?;
    match values.as_slice() {
        [north, south, east, west] => Some(GeoBounds::new(*north, *south, *east, *west)),
        _ => None,
    }
}

async fn roles(app: &mut App, cmd: RolesCommand) -> Result<()> {
    if let RolesCommand::Tree { strategy } = cmd {
        let tree = if app.offline {
            match app.cache.load_role_tree(strategy)? {
                Some(cached) => {
                    eprintln!("(cached {})", cached.age_display());
                    cached.data
                }
                None => bail!("No cached roles for strategy {}", strategy),
            }
        } else {
            let editor = RoleEditor::load(app.client().await?, strategy).await?;
            let tree = editor.into_tree();
            save_or_warn("roles", app.cache.save_role_tree(&tree));
            tree
        };
        print!("{}", render::role_tree(&tree));
        return Ok(());
    }

    let strategy = match &cmd {
        RolesCommand::Tree { strategy }
        | RolesCommand::Add { strategy, .. }
        | RolesCommand::Rename { strategy, .. }
        | RolesCommand::Delete { strategy, .. }
        | RolesCommand::Assign { strategy, .. }
        | RolesCommand::Unassign { strategy, .. } => *strategy,
    };
    let client = app.client().await?;
    let mut editor = RoleEditor::load(client.clone(), strategy).await?;

    match cmd {
        RolesCommand::Tree { .. } => {}
        RolesCommand::Add { name, parent, .. } => {
            let id = match parent {
                Some(parent) => editor.create_child(parent, &name).await?,
                None => editor.create_root(&name).await?,
            };
            println!("Created role #{}", id);
        }
        RolesCommand::Rename { role, name, .. } => {
            editor.rename(role, &name).await?;
            println!("Renamed role #{}", role);
        }
        RolesCommand::Delete { role, yes, .. } => {
            let impact = editor.plan_delete(role)?;
            println!("{}", impact.warning());
            if impact.is_cascading() && !yes && !confirm("Continue?")? {
                println!("Cancelled.");
                return Ok(());
            }
            editor.delete(role).await?;
            println!("Deleted role #{}", role);
        }
        RolesCommand::Assign { role, person, .. } => {
            let person = client.fetch_person(person).await?;
            let name = person.full_name();
            if editor.assign(role, person).await? {
                println!("Assigned {} to role #{}", name, role);
            } else {
                println!("{} already holds role #{}", name, role);
            }
        }
        RolesCommand::Unassign { role, person, .. } => {
            if editor.unassign(role, person).await? {
                println!("Removed person #{} from role #{}", person, role);
            } else {
                println!("Person #{} does not hold role #{}", person, role);
            }
        }
    }

    save_or_warn("roles", app.cache.save_role_tree(editor.tree()));
    Ok(())
}

async fn attendance(app: &mut App, cmd: AttendanceCommand) -> Result<()> {
    let service = AttendanceService::new(app.client().await?);
    match cmd {
        AttendanceCommand::List {
            group,
            meeting,
            search,
            paging,
        } => {
            let query = AttendanceQuery::new(MeetingRef::new(group, meeting), paging.page, paging.size)
                .with_search(search.as_deref());
            let page = service.page(&query).await?;
            print!("{}", render::attendance_page(&page));
        }
        AttendanceCommand::Toggle {
            group,
            meeting,
            person,
        } => {
            let meeting_ref = MeetingRef::new(group, meeting);
            if !service.ensure_cached(meeting_ref, person, LOOKUP_PAGE_SIZE).await? {
                bail!("Person {} is not on the attendance list of meeting {}", person, meeting);
            }
            let status = service.toggle(meeting_ref, person).await?;
            println!("Person #{} is now {}", person, status);
            let summary = service.summary(meeting_ref).await?;
            print!("{}", render::summary(meeting, &summary));
        }
        AttendanceCommand::Summary { group, meeting } => {
            let summary = service.summary(MeetingRef::new(group, meeting)).await?;
            print!("{}", render::summary(meeting, &summary));
        }
        AttendanceCommand::Metrics { group, last } => {
            let client = app.client().await?;
            let meetings = client.fetch_meetings(group, 0, last).await?;
            let rows = service.summaries(group, &meetings.content).await;
            let metrics = AttendanceMetrics::aggregate(rows.iter().map(|(_, s)| s));
            print!("{}", render::metrics(&rows, &metrics));
        }
    }
    Ok(())
}

async fn people(app: &mut App, search: Option<String>, paging: Paging) -> Result<()> {
    if app.offline {
        let cached = app.cache.load_people()?.map(|c| CachedData {
            data: c
                .data
                .into_iter()
                .filter(|p| search.as_deref().map_or(true, |q| p.matches(q)))
                .collect(),
            cached_at: c.cached_at,
        });
        return print_cached("people", cached, render::people);
    }
    let page = app
        .client()
        .await?
        .fetch_people(paging.page, paging.size, search.as_deref())
        .await?;
    save_or_warn("people", app.cache.save_people(&page.content));
    print!("{}", render::people(&page.content));
    println!("({}, {} people)", page.position_display(), page.total_elements);
    Ok(())
}

fn print_cached<T>(label: &str, cached: Option<CachedData<Vec<T>>>, render: impl Fn(&[T]) -> String) -> Result<()> {
    match cached {
        Some(c) => {
            print!("{}", render(&c.data));
            eprintln!("(cached {})", c.age_display());
            Ok(())
        }
        None => bail!("No cached {} yet; run once without --offline", label),
    }
}

fn save_or_warn(label: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!(cache = label, error = %e, "Failed to update local cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        assert_eq!(
            parse_bounds("-23.4 -23.7 -46.5 -46.8"),
            Some(GeoBounds::new(-23.4, -23.7, -46.5, -46.8))
        );
        assert_eq!(parse_bounds("1 2 3"), None);
        assert_eq!(parse_bounds("1 2 3 x"), None);
        assert_eq!(parse_bounds(""), None);
    }
}
