//! Builtin allow-list: functions, constants and reserved names
//!
//! The table is built once on first use and never mutated. Every name an
//! expression may use without `{{...}}` lives here.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Builtin function type
pub type BuiltinFn = fn(&[f64]) -> f64;

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::Range(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(k) => write!(f, "{k}"),
            Arity::Range(lo, hi) => write!(f, "{lo} to {hi}"),
            Arity::AtLeast(k) => write!(f, "at least {k}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub arity: Arity,
    pub func: BuiltinFn,
}

/// Names allowed by validation that have no value of their own
pub const RESERVED: &[&str] = &["end"];

static CONSTANTS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    use std::f64::consts;
    HashMap::from([
        ("pi", consts::PI),
        ("PI", consts::PI),
        ("e", consts::E),
        ("E", consts::E),
        ("tau", consts::TAU),
        ("phi", 1.618_033_988_749_895),
        ("true", 1.0),
        ("false", 0.0),
        ("Infinity", f64::INFINITY),
        ("NaN", f64::NAN),
        ("LN2", consts::LN_2),
        ("LN10", consts::LN_10),
        ("LOG2E", consts::LOG2_E),
        ("LOG10E", consts::LOG10_E),
        ("SQRT2", consts::SQRT_2),
        ("SQRT1_2", consts::FRAC_1_SQRT_2),
    ])
});

static FUNCTIONS: LazyLock<HashMap<&'static str, Builtin>> = LazyLock::new(register_builtins);

fn register_builtins() -> HashMap<&'static str, Builtin> {
    use Arity::*;

    let mut builtins: HashMap<&'static str, Builtin> = HashMap::new();
    let mut add = |name: &'static str, arity: Arity, func: BuiltinFn| {
        builtins.insert(name, Builtin { arity, func });
    };

    add("abs", Exact(1), |a| a[0].abs());
    add("sqrt", Exact(1), |a| a[0].sqrt());
    add("cbrt", Exact(1), |a| a[0].cbrt());
    add("exp", Exact(1), |a| a[0].exp());
    add("expm1", Exact(1), |a| a[0].exp_m1());
    add("log", Range(1, 2), builtin_log);
    add("log10", Exact(1), |a| a[0].log10());
    add("log2", Exact(1), |a| a[0].log2());
    add("log1p", Exact(1), |a| a[0].ln_1p());

    add("sin", Exact(1), |a| a[0].sin());
    add("cos", Exact(1), |a| a[0].cos());
    add("tan", Exact(1), |a| a[0].tan());
    add("asin", Exact(1), |a| a[0].asin());
    add("acos", Exact(1), |a| a[0].acos());
    add("atan", Exact(1), |a| a[0].atan());
    add("atan2", Exact(2), |a| a[0].atan2(a[1]));
    add("sinh", Exact(1), |a| a[0].sinh());
    add("cosh", Exact(1), |a| a[0].cosh());
    add("tanh", Exact(1), |a| a[0].tanh());
    add("asinh", Exact(1), |a| a[0].asinh());
    add("acosh", Exact(1), |a| a[0].acosh());
    add("atanh", Exact(1), |a| a[0].atanh());

    add("floor", Exact(1), |a| a[0].floor());
    add("ceil", Exact(1), |a| a[0].ceil());
    add("round", Range(1, 2), builtin_round);
    add("fix", Exact(1), |a| a[0].trunc());
    add("trunc", Exact(1), |a| a[0].trunc());
    add("sign", Exact(1), builtin_sign);

    add("square", Exact(1), |a| a[0] * a[0]);
    add("cube", Exact(1), |a| a[0] * a[0] * a[0]);
    add("pow", Exact(2), |a| a[0].powf(a[1]));
    add("mod", Exact(2), |a| modulo(a[0], a[1]));
    add("nthRoot", Range(1, 2), builtin_nth_root);
    add("factorial", Exact(1), |a| factorial(a[0]));

    add("hypot", AtLeast(1), |a| a.iter().map(|x| x * x).sum::<f64>().sqrt());
    add("min", AtLeast(1), |a| a.iter().copied().fold(f64::INFINITY, f64::min));
    add("max", AtLeast(1), |a| a.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    add("sum", AtLeast(1), |a| a.iter().sum());
    add("mean", AtLeast(1), |a| a.iter().sum::<f64>() / a.len() as f64);

    builtins
}

fn builtin_log(args: &[f64]) -> f64 {
    match args {
        [x] => x.ln(),
        [x, base] => x.ln() / base.ln(),
        _ => f64::NAN,
    }
}

fn builtin_round(args: &[f64]) -> f64 {
    match args {
        [x] => x.round(),
        [x, digits] => {
            let factor = 10f64.powi(*digits as i32);
            (x * factor).round() / factor
        }
        _ => f64::NAN,
    }
}

fn builtin_sign(args: &[f64]) -> f64 {
    let x = args[0];
    if x == 0.0 || x.is_nan() { x } else { x.signum() }
}

fn builtin_nth_root(args: &[f64]) -> f64 {
    let (x, n) = match args {
        [x] => (*x, 2.0),
        [x, n] => (*x, *n),
        _ => return f64::NAN,
    };
    // odd roots of negative numbers stay real
    if x < 0.0 && n.fract() == 0.0 && (n as i64) % 2 != 0 {
        -(-x).powf(1.0 / n)
    } else {
        x.powf(1.0 / n)
    }
}

/// Floored modulo; the result takes the sign of the divisor. `x mod 0` is `x`.
pub fn modulo(x: f64, y: f64) -> f64 {
    if y == 0.0 { x } else { x - y * (x / y).floor() }
}

/// Factorial of a non-negative integer; NaN otherwise
pub fn factorial(n: f64) -> f64 {
    if n < 0.0 || n.fract() != 0.0 {
        return f64::NAN;
    }
    if n > 170.0 {
        return f64::INFINITY;
    }
    (1..=n as u32).fold(1.0, |acc, k| acc * k as f64)
}

pub fn function(name: &str) -> Option<&'static Builtin> {
    FUNCTIONS.get(name)
}

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.get(name).copied()
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Whether `name` may appear bare (without `{{...}}`) in an expression
pub fn is_allowed(name: &str) -> bool {
    FUNCTIONS.contains_key(name) || CONSTANTS.contains_key(name) || is_reserved(name)
}

/// All builtin names, sorted
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FUNCTIONS
        .keys()
        .chain(CONSTANTS.keys())
        .copied()
        .chain(RESERVED.iter().copied())
        .collect();
    names.sort_unstable();
    names
}
