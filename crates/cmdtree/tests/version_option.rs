use cmdtree::{AppRunner, AppSettings, ClassDecl, HelpVerbosity};

fn app(show_version_option: bool, verbosity: HelpVerbosity) -> AppRunner {
    let settings = AppSettings {
        show_version_option,
        default_help_verbosity: verbosity,
        app_name: Some("testhost.dll".to_string()),
        version: Some("16.2.0".to_string()),
        ..AppSettings::default()
    };
    AppRunner::new(ClassDecl::new("App"), settings).expect("valid declarations")
}

#[test]
fn enabled_basic_help_includes_version_option() {
    let r = app(true, HelpVerbosity::Basic).run_in_mem(["-h"], "");
    assert_eq!(r.exit_code, 0);
    assert!(r.out.contains("-v | --version  Show version information"), "{}", r.out);
}

#[test]
fn enabled_detailed_help_includes_version_option() {
    let r = app(true, HelpVerbosity::Detailed).run_in_mem(["-h"], "");
    assert_eq!(r.exit_code, 0);
    assert!(
        r.out.contains("  -v | --version\n  Show version information\n"),
        "{}",
        r.out
    );
}

#[test]
fn disabled_help_omits_version_option() {
    for verbosity in [HelpVerbosity::Basic, HelpVerbosity::Detailed] {
        let r = app(false, verbosity).run_in_mem(["-h"], "");
        assert_eq!(r.exit_code, 0);
        assert!(!r.out.contains("-v | --version"), "{}", r.out);
    }
}

#[test]
fn long_alias_outputs_name_and_version() {
    let r = app(true, HelpVerbosity::Detailed).run_in_mem(["--version"], "");
    assert_eq!(r.exit_code, 0);
    assert_eq!(r.out, "testhost.dll\n16.2.0\n");
}

#[test]
fn short_alias_outputs_name_and_version() {
    let r = app(true, HelpVerbosity::Detailed).run_in_mem(["-v"], "");
    assert_eq!(r.exit_code, 0);
    assert_eq!(r.out, "testhost.dll\n16.2.0\n");
}

#[test]
fn disabled_long_alias_is_not_recognized() {
    let r = app(false, HelpVerbosity::Detailed).run_in_mem(["--version"], "");
    assert_eq!(r.exit_code, 1);
    assert!(r.all.contains("Unrecognized option '--version'"), "{}", r.all);
}

#[test]
fn disabled_short_alias_is_not_recognized() {
    let r = app(false, HelpVerbosity::Detailed).run_in_mem(["-v"], "");
    assert_eq!(r.exit_code, 1);
    assert!(r.all.contains("Unrecognized option '-v'"), "{}", r.all);
}
