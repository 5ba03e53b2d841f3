//! Output size expressions.
//!
//! A dimension is an arithmetic expression with `+ - * /` and parentheses
//! over numbers and these variables:
//! - `iw`/`in_w`, `ih`/`in_h`: input size.
//! - `ow`/`out_w`, `oh`/`out_h`: output size, as far as already known.
//! - `a`: input width over height, `sar`: input sample aspect ratio (1 when
//!   unknown), `dar`: `a * sar`.
//! - `hsub`/`vsub`, `ohsub`/`ovsub`: chroma subsampling factors of the input
//!   and output formats.
//!
//! The width is evaluated first (failures ignored), then the height, then
//! the width again so each may refer to the other. After evaluation:
//! - `0` keeps the input size of that axis.
//! - `-1` derives the axis from the other one, keeping the input aspect
//!   ratio. `-n` does the same and rounds to a multiple of `n`.
//! - Both axes negative keeps the input size.

use crate::error::ScaleError;
use crate::format::PixelFormat;
use crate::scaler::InputProps;

/// Evaluates the width and height expressions for `input` scaled into
/// `out_format`.
pub fn eval_dimensions(
    width_expr: &str,
    height_expr: &str,
    input: &InputProps,
    out_format: PixelFormat,
) -> Result<(usize, usize), ScaleError> {
    let (in_w, in_h) = (input.width as f64, input.height as f64);
    let sar = input.sample_aspect_ratio;
    let sar = if sar.is_unknown() {
        1.0
    } else {
        sar.num as f64 / sar.den as f64
    };
    let a = in_w / in_h;
    let (ind, outd) = (input.format.desc(), out_format.desc());
    let mut vars = Vars {
        in_w,
        in_h,
        out_w: f64::NAN,
        out_h: f64::NAN,
        a,
        sar,
        dar: a * sar,
        hsub: (1u32 << ind.log2_chroma_w) as f64,
        vsub: (1u32 << ind.log2_chroma_h) as f64,
        ohsub: (1u32 << outd.log2_chroma_w) as f64,
        ovsub: (1u32 << outd.log2_chroma_h) as f64,
    };
    let or_input = |v: i64, size: usize| if v == 0 { size as i64 } else { v };

    if let Ok(w) = eval(width_expr, &vars) {
        vars.out_w = or_input(w, input.width) as f64;
    }
    let h = or_input(eval(height_expr, &vars)?, input.height);
    vars.out_h = h as f64;
    let w = or_input(eval(width_expr, &vars)?, input.width);

    resolve(w, h, input.width as i64, input.height as i64)
}

fn resolve(w: i64, h: i64, in_w: i64, in_h: i64) -> Result<(usize, usize), ScaleError> {
    let (mut w, mut h) = (w as i128, h as i128);
    let (in_w, in_h) = (in_w as i128, in_h as i128);
    let factor_w = if w < -1 { -w } else { 1 };
    let factor_h = if h < -1 { -h } else { 1 };

    if w < 0 && h < 0 {
        w = in_w;
        h = in_h;
    }
    if w < 0 {
        w = rescale(h, in_w, in_h * factor_w) * factor_w;
    }
    if h < 0 {
        h = rescale(w, in_h, in_w * factor_h) * factor_h;
    }

    if w <= 0 || h <= 0 {
        return Err(ScaleError::InvalidDimensions {
            width: saturate(w),
            height: saturate(h),
        });
    }
    if h * in_w > i32::MAX as i128 || w * in_h > i32::MAX as i128 {
        return Err(ScaleError::DimensionsTooLarge {
            width: saturate(w),
            height: saturate(h),
            in_width: in_w as usize,
            in_height: in_h as usize,
        });
    }
    Ok((w as usize, h as usize))
}

/// `a * b / c` rounded to nearest.
fn rescale(a: i128, b: i128, c: i128) -> i128 {
    if c == 0 {
        return 0;
    }
    (a * b + c / 2) / c
}

fn saturate(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

struct Vars {
    in_w: f64,
    in_h: f64,
    out_w: f64,
    out_h: f64,
    a: f64,
    sar: f64,
    dar: f64,
    hsub: f64,
    vsub: f64,
    ohsub: f64,
    ovsub: f64,
}

fn eval(expr: &str, vars: &Vars) -> Result<i64, ScaleError> {
    let fail = |reason: &str| ScaleError::DimensionExpr {
        expr: expr.to_string(),
        reason: reason.to_string(),
    };

    let tokens = tokenize(expr).map_err(|r| fail(&r))?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        vars,
    };
    let value = parser.expr().map_err(|r| fail(&r))?;
    if parser.pos != tokens.len() {
        return Err(fail("trailing input"));
    }
    if !value.is_finite() {
        return Err(fail("result is not finite"));
    }
    if value.abs() > i64::MAX as f64 / 2.0 {
        return Err(fail("result out of range"));
    }
    Ok(value.trunc() as i64)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Var(String),
    Op(char),
    Open,
    Close,
}

fn tokenize(s: &str) -> Result<Vec<Token>, String> {
    let mut out = Vec::new();
    let mut chars = s.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = i;
                while let Some(&(j, d)) = chars.peek()
                    && (d.is_ascii_digit() || d == '.')
                {
                    end = j + d.len_utf8();
                    chars.next();
                }
                let n = s[i..end]
                    .parse::<f64>()
                    .map_err(|_| format!("bad number '{}'", &s[i..end]))?;
                out.push(Token::Num(n));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut end = i;
                while let Some(&(j, d)) = chars.peek()
                    && (d.is_ascii_alphanumeric() || d == '_')
                {
                    end = j + d.len_utf8();
                    chars.next();
                }
                out.push(Token::Var(s[i..end].to_string()));
            }
            '+' | '-' | '*' | '/' => {
                out.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                out.push(Token::Open);
                chars.next();
            }
            ')' => {
                out.push(Token::Close);
                chars.next();
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    if out.is_empty() {
        return Err("empty expression".to_string());
    }
    Ok(out)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    vars: &'t Vars,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, String> {
        let mut acc = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<f64, String> {
        let mut acc = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.factor()?;
            acc = if op == '*' {
                acc * rhs
            } else {
                if rhs == 0.0 {
                    return Err("division by zero".to_string());
                }
                acc / rhs
            };
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<f64, String> {
        let vars = self.vars;
        match self.next().cloned() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Var(name)) => match name.as_str() {
                "iw" | "in_w" => Ok(vars.in_w),
                "ih" | "in_h" => Ok(vars.in_h),
                "ow" | "out_w" => Ok(vars.out_w),
                "oh" | "out_h" => Ok(vars.out_h),
                "a" => Ok(vars.a),
                "sar" => Ok(vars.sar),
                "dar" => Ok(vars.dar),
                "hsub" => Ok(vars.hsub),
                "vsub" => Ok(vars.vsub),
                "ohsub" => Ok(vars.ohsub),
                "ovsub" => Ok(vars.ovsub),
                _ => Err(format!("unknown variable '{name}'")),
            },
            Some(Token::Op('-')) => Ok(-self.factor()?),
            Some(Token::Op('+')) => self.factor(),
            Some(Token::Open) => {
                let v = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(v),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(t) => Err(format!("unexpected {t:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
