use crate::details::icmp::AddressFamily;
use crate::details::records::ProbeRecord;
use crate::PingStatistics;
use std::net::IpAddr;

pub(crate) fn aggregate(address: IpAddr, family: AddressFamily, record: &ProbeRecord) -> PingStatistics {
    let rtts: Vec<f64> = record.samples.iter().map(|sample| sample.rtt.as_secs_f64()).collect();
    let mut sorted = rtts.clone();
    sorted.sort_by(f64::total_cmp);

    PingStatistics {
        address,
        family,
        sent: record.sent,
        received: record.received(),
        loss_percent: loss_percent(record.sent, record.received()),
        rtt_min: sorted.first().copied(),
        rtt_max: sorted.last().copied(),
        rtt_mean: mean(&rtts),
        rtt_median: median(&sorted),
        rtt_jitter: sample_std_dev(&rtts),
        rtt_p95: percentile(&sorted, 0.95),
        rtts,
        ttl: record.ttl,
        hops: record.ttl.map(|ttl| ttl.hops()),
        os_guess: record.ttl.map(|ttl| ttl.os_guess()),
    }
}

fn loss_percent(sent: u16, received: u16) -> f64 {
    if sent == 0 {
        return 100.0;
    }
    f64::from(sent - received) / f64::from(sent) * 100.0
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

// n - 1 in the denominator.
#[allow(clippy::cast_precision_loss)]
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let Some(average) = mean(values) else {
        return 0.0;
    };
    let squares: f64 = values.iter().map(|value| (value - average).powi(2)).sum();
    (squares / (values.len() - 1) as f64).sqrt()
}

/// Percentile by linear interpolation between the closest ranks of the sorted samples.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentile(sorted: &[f64], fraction: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            let rank = (n - 1) as f64 * fraction;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                return Some(sorted[lower]);
            }
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64))
        }
    }
}
