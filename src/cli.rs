//! Command-line argument parsing for SiteCheck

/// Parse command line arguments
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub validate: bool,
    pub help: bool,
}

pub fn parse_args() -> Args {
    parse_from(std::env::args())
}

/// Parse from an explicit argument list; the first item is the program name.
/// Unknown arguments are ignored.
pub fn parse_from<I, S>(args: I) -> Args
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = Args::default();

    for arg in args.into_iter().skip(1) {
        match arg.as_ref() {
            "--validate" => result.validate = true,
            "--help" | "-h" => result.help = true,
            _ => {}
        }
    }

    result
}

pub fn print_help() {
    println!("SiteCheck - Website monitor with voice-call alerts\n");
    println!("USAGE:");
    println!("    sitecheck [OPTIONS]\n");
    println!("Checks every configured URL once, calls YOUR_PHONE_NUMBER when one is down, and exits.\n");
    println!("OPTIONS:");
    println!("    --validate              Validate configuration and exit");
    println!("    --help, -h              Show this help message\n");
    println!("ENVIRONMENT:");
    println!("    TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN   Twilio credentials");
    println!("    TWILIO_PHONE_NUMBER                     Caller id for alert calls");
    println!("    YOUR_PHONE_NUMBER                       Number to call");
    println!("    SSL_CERTIFICATE                         PEM trust anchor (optional)");
    println!("    SSL_CERT_PATH                           Where to write it (default /tmp/myfundbox.crt)");
    println!("    MONITOR_URLS                            Comma-separated URL override (optional)");
    println!("    ALERT_ON_UNREACHABLE                    Also call on connection failures (default false)");
}
