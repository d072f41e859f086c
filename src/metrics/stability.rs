// Year-over-year stability analysis.
//
// Lags each team-season EPA metric by one season, then fits an ordinary
// least-squares regression of every current-season metric on every
// prior-season metric, per role. R-squared of those fits is the stability
// measure: how much of this season's efficiency last season's numbers
// explain. Recomputes from scratch on every invocation.

use crate::metrics::aggregate::{Role, TeamSeasonMetric};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The two per-play-type EPA metrics carried by a team-season row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpaMetric {
    Pass,
    Rush,
}

impl EpaMetric {
    pub const ALL: [EpaMetric; 2] = [EpaMetric::Pass, EpaMetric::Rush];

    pub fn label(&self) -> &'static str {
        match self {
            EpaMetric::Pass => "epa_per_pass",
            EpaMetric::Rush => "epa_per_rush",
        }
    }
}

/// A team-season metric row joined with the same team/role's values from the
/// immediately preceding season. The earliest observed season for a team has
/// no lagged values; so does a season following a gap in the record.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedMetric {
    pub season: u16,
    pub team: String,
    pub role: Role,
    pub epa_per_pass: Option<f64>,
    pub epa_per_rush: Option<f64>,
    pub prev_epa_per_pass: Option<f64>,
    pub prev_epa_per_rush: Option<f64>,
}

impl LaggedMetric {
    fn current(&self, metric: EpaMetric) -> Option<f64> {
        match metric {
            EpaMetric::Pass => self.epa_per_pass,
            EpaMetric::Rush => self.epa_per_rush,
        }
    }

    fn previous(&self, metric: EpaMetric) -> Option<f64> {
        match metric {
            EpaMetric::Pass => self.prev_epa_per_pass,
            EpaMetric::Rush => self.prev_epa_per_rush,
        }
    }
}

/// A fitted simple linear regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub n: usize,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value for the slope (t-test, n - 2 degrees of freedom).
    pub p_value: f64,
}

/// Why a (target, predictor) pair could not be fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooFewObservations,
    NoPredictorVariance,
    NoTargetVariance,
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::TooFewObservations => "fewer than 3 usable observations",
            SkipReason::NoPredictorVariance => "no variance in predictor",
            SkipReason::NoTargetVariance => "no variance in target",
        }
    }
}

/// One fitted (role, target, predictor) combination.
#[derive(Debug, Clone)]
pub struct StabilityFit {
    pub role: Role,
    pub target: EpaMetric,
    pub predictor: EpaMetric,
    pub fit: LinearFit,
}

/// A combination that was reported rather than fitted.
#[derive(Debug, Clone)]
pub struct SkippedPair {
    pub role: Role,
    pub target: EpaMetric,
    pub predictor: EpaMetric,
    pub n: usize,
    pub reason: SkipReason,
}

/// The full stability report: fits sorted descending by R-squared, plus the
/// combinations that could not be fitted.
#[derive(Debug, Clone, Default)]
pub struct StabilityReport {
    pub fits: Vec<StabilityFit>,
    pub skipped: Vec<SkippedPair>,
}

// ---------------------------------------------------------------------------
// Lagging
// ---------------------------------------------------------------------------

/// Join each metric row with the same (team, role)'s previous-season values.
///
/// Ordering within each group is made explicit (ascending by season) rather
/// than relying on input row order. A previous season means exactly
/// `season - 1`; a gap in the record does not lag across it.
pub fn lag_metrics(metrics: &[TeamSeasonMetric]) -> Vec<LaggedMetric> {
    let mut groups: BTreeMap<(&str, Role), Vec<&TeamSeasonMetric>> = BTreeMap::new();
    for m in metrics {
        groups.entry((m.team.as_str(), m.role)).or_default().push(m);
    }

    let mut lagged = Vec::with_capacity(metrics.len());
    for rows in groups.into_values() {
        let mut rows = rows;
        rows.sort_by_key(|m| m.season);

        for (i, m) in rows.iter().enumerate() {
            let prev = (i > 0)
                .then(|| rows[i - 1])
                .filter(|p| p.season + 1 == m.season);
            lagged.push(LaggedMetric {
                season: m.season,
                team: m.team.clone(),
                role: m.role,
                epa_per_pass: m.epa_per_pass,
                epa_per_rush: m.epa_per_rush,
                prev_epa_per_pass: prev.and_then(|p| p.epa_per_pass),
                prev_epa_per_rush: prev.and_then(|p| p.epa_per_rush),
            });
        }
    }

    lagged.sort_by(|a, b| {
        (a.season, &a.team, a.role).cmp(&(b.season, &b.team, b.role))
    });
    lagged
}

// ---------------------------------------------------------------------------
// Ordinary least squares
// ---------------------------------------------------------------------------

/// Minimum observations required for a fit (two points always fit exactly).
const MIN_OBSERVATIONS: usize = 3;

/// Threshold below which a sum of squares is treated as zero.
const SS_EPSILON: f64 = 1e-12;

/// Fit `y = intercept + slope * x` by ordinary least squares.
///
/// `xs` and `ys` must be the same length. Degenerate inputs (too few points,
/// constant predictor, constant target) are reported as a `SkipReason`
/// instead of producing NaN statistics.
pub fn fit_ols(xs: &[f64], ys: &[f64]) -> Result<LinearFit, SkipReason> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len();
    if n < MIN_OBSERVATIONS {
        return Err(SkipReason::TooFewObservations);
    }

    let nf = n as f64;
    let x_mean = xs.iter().sum::<f64>() / nf;
    let y_mean = ys.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx < SS_EPSILON {
        return Err(SkipReason::NoPredictorVariance);
    }
    if syy < SS_EPSILON {
        return Err(SkipReason::NoTargetVariance);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r_squared = (sxy * sxy) / (sxx * syy);

    let df = (n - 2) as f64;
    let residual_ss = (syy - slope * sxy).max(0.0);
    let p_value = if residual_ss < SS_EPSILON {
        // Exact fit: zero standard error, slope is trivially significant
        0.0
    } else {
        let se_slope = (residual_ss / df / sxx).sqrt();
        let t = slope / se_slope;
        reg_incomplete_beta(0.5 * df, 0.5, df / (df + t * t))
    };

    Ok(LinearFit {
        n,
        slope,
        intercept,
        r_squared,
        p_value,
    })
}

// ---------------------------------------------------------------------------
// Stability report
// ---------------------------------------------------------------------------

/// Fit every (target, predictor) metric pair per role and return the report,
/// fits sorted descending by R-squared.
pub fn analyze_stability(metrics: &[TeamSeasonMetric]) -> StabilityReport {
    let lagged = lag_metrics(metrics);
    let mut report = StabilityReport::default();

    for role in [Role::Offense, Role::Defense] {
        for target in EpaMetric::ALL {
            for predictor in EpaMetric::ALL {
                let mut xs = Vec::new();
                let mut ys = Vec::new();
                for row in lagged.iter().filter(|l| l.role == role) {
                    if let (Some(x), Some(y)) = (row.previous(predictor), row.current(target)) {
                        xs.push(x);
                        ys.push(y);
                    }
                }

                match fit_ols(&xs, &ys) {
                    Ok(fit) => report.fits.push(StabilityFit {
                        role,
                        target,
                        predictor,
                        fit,
                    }),
                    Err(reason) => report.skipped.push(SkippedPair {
                        role,
                        target,
                        predictor,
                        n: xs.len(),
                        reason,
                    }),
                }
            }
        }
    }

    report.fits.sort_by(|a, b| {
        b.fit
            .r_squared
            .partial_cmp(&a.fit.r_squared)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    report
}

// ---------------------------------------------------------------------------
// Regularized incomplete beta (for the t-distribution tail)
// ---------------------------------------------------------------------------

/// Natural log of the gamma function (Lanczos approximation, g = 5).
fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];

    let mut ser = 1.000_000_000_190_015;
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

/// Continued-fraction expansion for the incomplete beta (modified Lentz).
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const FPMIN: f64 = 1e-300;
    const CF_EPSILON: f64 = 1e-14;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < CF_EPSILON {
            break;
        }
    }

    h
}

/// Regularized incomplete beta function I_x(a, b).
fn reg_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_bt = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
        + a * x.ln()
        + b * (1.0 - x).ln();
    let bt = ln_bt.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        bt * beta_cf(a, b, x) / a
    } else {
        1.0 - bt * beta_cf(b, a, 1.0 - x) / b
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
