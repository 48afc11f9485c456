use super::*;

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["coffeehaus-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["coffeehaus-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["coffeehaus-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn search_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from([
        "coffeehaus-cli",
        "search",
        "coffee near me",
        "--lat",
        "33.7514",
        "--lng",
        "-117.994",
        "--radius",
        "3000",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Search {
            query,
            lat,
            lng,
            radius,
            limit,
            offset,
        }) => {
            assert_eq!(query, "coffee near me");
            assert!((lat.expect("lat") - 33.7514).abs() < 1e-9);
            assert!((lng.expect("lng") + 117.994).abs() < 1e-9);
            assert_eq!(radius, Some(3000));
            assert_eq!(limit, None);
            assert_eq!(offset, 0);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn search_requires_a_query() {
    assert!(Cli::try_parse_from(["coffeehaus-cli", "search"]).is_err());
}

#[test]
fn parses_sync_place_command() {
    let cli = Cli::try_parse_from(["coffeehaus-cli", "sync-place", "ChIJ123"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::SyncPlace { ref place_id }) if place_id == "ChIJ123"
    ));
}

#[test]
fn search_request_without_coordinates_has_unknown_location() {
    let request = commands::search_request("latte".to_owned(), None, None, None, Some(5), 10);

    assert!(!request.location.is_known());
    assert_eq!(request.limit, Some(5));
    assert_eq!(request.offset, 10);
}
