//! Command-line arguments.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "shepherd", version, about = "Home groups, roles and attendance for your church")]
pub struct Cli {
    /// Read from the local cache instead of the API
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the password in the OS keychain
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the session and stored password
    Logout,
    /// Home groups
    #[command(subcommand)]
    Groups(GroupsCommand),
    /// Role hierarchies of a strategy
    #[command(subcommand)]
    Roles(RolesCommand),
    /// Meeting attendance
    #[command(subcommand)]
    Attendance(AttendanceCommand),
    /// Registered people
    People {
        #[arg(short, long)]
        search: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Churches in the organization
    Churches {
        #[command(flatten)]
        paging: Paging,
    },
    /// Scheduled worship services
    Worships {
        /// Only services of this church
        #[arg(long)]
        church: Option<i64>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Church events
    Events {
        #[command(flatten)]
        paging: Paging,
    },
    /// Show what is cached locally and how old it is
    Cache,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct Paging {
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long, default_value_t = shepherd_core::api::client::DEFAULT_PAGE_SIZE)]
    pub size: u32,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    List {
        #[command(flatten)]
        paging: Paging,
    },
    Show {
        group: i64,
    },
    /// Groups within a radius (in degrees) of a point
    Near {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        #[arg(long, default_value_t = 0.05)]
        radius: f64,
    },
    /// Read "north south east west" viewports from stdin and query each
    /// once the input settles
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum RolesCommand {
    /// Print the role tree with people counts
    Tree { strategy: i64 },
    /// Create a role; without --parent it becomes a root
    Add {
        strategy: i64,
        name: String,
        #[arg(long)]
        parent: Option<i64>,
    },
    Rename {
        strategy: i64,
        role: i64,
        name: String,
    },
    /// Delete a role and everything below it
    Delete {
        strategy: i64,
        role: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    Assign {
        strategy: i64,
        role: i64,
        person: i64,
    },
    Unassign {
        strategy: i64,
        role: i64,
        person: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum AttendanceCommand {
    List {
        group: i64,
        meeting: i64,
        #[arg(short, long)]
        search: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Flip a person between present and absent
    Toggle {
        group: i64,
        meeting: i64,
        person: i64,
    },
    /// Present/absent counts of one meeting
    Summary { group: i64, meeting: i64 },
    /// Aggregate attendance over a group's recent meetings
    Metrics {
        group: i64,
        /// How many of the newest meetings to include
        #[arg(long, default_value_t = 10)]
        last: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_roles_delete() {
        let cli = Cli::try_parse_from(["shepherd", "roles", "delete", "3", "12", "--yes"])
            .expect("parse");
        match cli.command {
            Command::Roles(RolesCommand::Delete { strategy, role, yes }) => {
                assert_eq!((strategy, role, yes), (3, 12, true));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let cli = Cli::try_parse_from(["shepherd", "groups", "near", "-23.55", "-46.63", "--offline"])
            .expect("parse");
        assert!(cli.offline);
        match cli.command {
            Command::Groups(GroupsCommand::Near { latitude, longitude, radius }) => {
                assert_eq!((latitude, longitude), (-23.55, -46.63));
                assert_eq!(radius, 0.05);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_paging_defaults() {
        let cli = Cli::try_parse_from(["shepherd", "people", "-s", "ana"]).expect("parse");
        match cli.command {
            Command::People { search, paging } => {
                assert_eq!(search.as_deref(), Some("ana"));
                assert_eq!(paging.page, 0);
                assert_eq!(paging.size, 20);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
