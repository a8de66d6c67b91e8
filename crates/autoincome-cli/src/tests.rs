use super::*;
use autoincome_core::OrderStatus;
use rust_decimal_macros::dec;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["autoincome-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["autoincome-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["autoincome-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_every_job_name() {
    for kind in &JobKind::ALL {
        let cli = Cli::try_parse_from(["autoincome-cli", "run", kind.as_str()])
            .expect("expected valid cli args");
        assert!(matches!(cli.command, Some(Commands::Run { job }) if job == *kind));
    }
}

#[test]
fn unknown_job_is_rejected() {
    assert!(Cli::try_parse_from(["autoincome-cli", "run", "payroll"]).is_err());
}

#[test]
fn parses_plan_command() {
    let cli = Cli::try_parse_from(["autoincome-cli", "plan", "42"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Plan { opportunity_id: 42 })
    ));
}

#[test]
fn order_command_defaults() {
    let cli = Cli::try_parse_from([
        "autoincome-cli",
        "order",
        "--email",
        "ada@example.com",
        "--stream-id",
        "3",
        "--amount",
        "49.90",
    ])
    .unwrap();

    let Some(Commands::Order(args)) = cli.command else {
        panic!("expected order command");
    };
    assert_eq!(args.email, "ada@example.com");
    assert_eq!(args.stream_id, 3);
    assert_eq!(args.amount, dec!(49.90));
    assert_eq!(args.quantity, 1);
    assert_eq!(args.status, OrderStatus::Completed);
    assert_eq!(args.source, "direct");
    assert!(args.product_id.is_none());
}

#[test]
fn order_command_with_status_and_product() {
    let cli = Cli::try_parse_from([
        "autoincome-cli",
        "order",
        "--email",
        "bob@example.com",
        "--stream-id",
        "1",
        "--amount",
        "20",
        "--product-id",
        "7",
        "--quantity",
        "2",
        "--status",
        "refunded",
    ])
    .unwrap();

    let Some(Commands::Order(args)) = cli.command else {
        panic!("expected order command");
    };
    assert_eq!(args.product_id, Some(7));
    assert_eq!(args.quantity, 2);
    assert_eq!(args.status, OrderStatus::Refunded);
}

#[test]
fn order_command_rejects_unknown_status() {
    let result = Cli::try_parse_from([
        "autoincome-cli",
        "order",
        "--email",
        "bob@example.com",
        "--stream-id",
        "1",
        "--amount",
        "20",
        "--status",
        "shipped",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_report_subcommands() {
    for (name, expected) in [
        ("streams", "Streams"),
        ("summary", "Summary"),
        ("segments", "Segments"),
        ("customers", "Customers"),
        ("reinvestment", "Reinvestment"),
        ("dashboard", "Dashboard"),
    ] {
        let cli = Cli::try_parse_from(["autoincome-cli", "report", name]).unwrap();
        let Some(Commands::Report { command }) = cli.command else {
            panic!("expected report command for {name}");
        };
        assert_eq!(format!("{command:?}"), expected);
    }
}
