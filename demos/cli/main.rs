use argh::FromArgs;
use ping_probe::{PingError, PingStatistics, ProbeConfig};
use std::process::ExitCode;
use std::time::Duration;

/// Ping a host with ICMP echo requests and print statistics.
#[derive(FromArgs)]
struct Args {
    /// host name or IP address to ping
    #[argh(positional)]
    host: String,

    /// number of packets (default: 4)
    #[argh(option, short = 'c', default = "4")]
    count: u16,

    /// timeout per packet in seconds (default: 1)
    #[argh(option, short = 't', default = "1.0")]
    timeout: f64,

    /// interval between packets in seconds (default: 0.1)
    #[argh(option, short = 'i', default = "0.1")]
    interval: f64,

    /// payload size in bytes (default: 8)
    #[argh(option, short = 's', default = "8")]
    size: usize,

    /// DSCP value (0-63)
    #[argh(option)]
    dscp: Option<u8>,

    /// show all individual round-trip times
    #[argh(switch)]
    show_rtts: bool,

    /// output in JSON format
    #[argh(switch, short = 'j')]
    json: bool,

    /// enable debug logging
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn print_statistics(host: &str, statistics: &PingStatistics, show_rtts: bool) {
    println!("\nPing statistics for {host} ({}):", statistics.address);
    println!(
        "  Packets: sent={}, received={}, loss={:.1}%",
        statistics.sent, statistics.received, statistics.loss_percent
    );
    if let (Some(min), Some(mean), Some(max), Some(median), Some(p95)) = (
        statistics.rtt_min,
        statistics.rtt_mean,
        statistics.rtt_max,
        statistics.rtt_median,
        statistics.rtt_p95,
    ) {
        println!(
            "  RTT min/avg/max/median/jitter: {min:.4}/{mean:.4}/{max:.4}/{median:.4}/{:.4} sec",
            statistics.rtt_jitter
        );
        println!("  p95: {p95:.4} sec");
    }
    match (statistics.ttl, statistics.hops, statistics.os_guess) {
        (Some(ttl), Some(hops), Some(os_guess)) => println!("  TTL: {ttl}, hops: {hops}, OS guess: {os_guess}"),
        _ => println!("  TTL: n/a"),
    }
    if show_rtts {
        let rtts: Vec<String> = statistics.rtts.iter().map(|rtt| format!("{rtt:.4}")).collect();
        println!("  All RTTs: [{}]", rtts.join(", "));
    }
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    if args.verbose {
        tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
    }

    let config = ProbeConfig {
        count: args.count,
        timeout: seconds(args.timeout),
        interval: seconds(args.interval),
        size: args.size,
        dscp: args.dscp,
        ..ProbeConfig::new(&args.host)
    };

    match ping_probe::probe(&config) {
        Ok(statistics) if args.json => match serde_json::to_string_pretty(&statistics) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Ok(statistics) => {
            print_statistics(&args.host, &statistics, args.show_rtts);
            ExitCode::SUCCESS
        }
        Err(e) => {
            match &e {
                PingError::HostUnreachable { .. } => eprintln!("Host unreachable or cannot resolve host."),
                PingError::PermissionDenied(_) => {
                    eprintln!("Root privileges or CAP_NET_RAW are required to use ICMP RAW sockets.");
                }
                PingError::PingTimeout { .. } => eprintln!("Request timed out: no replies received."),
                PingError::DestinationUnreachable { code, reason } => {
                    eprintln!("Destination unreachable: {reason} (code {code})");
                }
                _ => eprintln!("Error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
