//! Template parsing and rendering.

use std::collections::BTreeSet;

use crate::env::Environment;
use crate::error::{Result, TemplateError};

/// A piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied through unchanged.
    Literal(&'a str),
    /// A `$NAME` or `${NAME}` reference.
    Reference {
        /// The variable name.
        name: &'a str,
        /// The reference exactly as written, used when it is left unexpanded.
        raw: &'a str,
    },
}

/// A template split into literal text and variable references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    /// Split `src` into segments. Parsing never fails: malformed references
    /// are literal text.
    pub fn parse(src: &'a str) -> Self {
        let bytes = src.as_bytes();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }
            match scan_reference(bytes, i) {
                Some((name_start, name_end, end)) => {
                    if literal_start < i {
                        segments.push(Segment::Literal(&src[literal_start..i]));
                    }
                    segments.push(Segment::Reference {
                        name: &src[name_start..name_end],
                        raw: &src[i..end],
                    });
                    i = end;
                    literal_start = end;
                }
                None => i += 1,
            }
        }
        if literal_start < src.len() {
            segments.push(Segment::Literal(&src[literal_start..]));
        }

        Template { segments }
    }

    /// The parsed segments, in source order.
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Names of every referenced variable, deduplicated and sorted.
    pub fn variables(&self) -> BTreeSet<&'a str> {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::Reference { name, .. } => Some(*name),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Expand references against `env`.
    pub fn render(&self, env: &Environment, options: &SubstOptions) -> Result<Rendered> {
        let mut text = String::new();
        let mut unresolved = BTreeSet::new();

        for seg in &self.segments {
            match *seg {
                Segment::Literal(s) => text.push_str(s),
                Segment::Reference { name, raw } => {
                    if !options.permits(name) {
                        text.push_str(raw);
                        continue;
                    }
                    match env.get(name) {
                        Some(value) => text.push_str(value),
                        None if options.strict => {
                            return Err(TemplateError::Undefined {
                                name: name.to_owned(),
                            })
                        }
                        None => {
                            unresolved.insert(name.to_owned());
                        }
                    }
                }
            }
        }

        Ok(Rendered { text, unresolved })
    }
}

/// Returns `(name_start, name_end, reference_end)` for a reference starting at
/// the `$` at `dollar`.
fn scan_reference(bytes: &[u8], dollar: usize) -> Option<(usize, usize, usize)> {
    let next = *bytes.get(dollar + 1)?;
    if next == b'{' {
        let start = dollar + 2;
        let end = identifier_end(bytes, start)?;
        (bytes.get(end) == Some(&b'}')).then_some((start, end, end + 1))
    } else {
        let start = dollar + 1;
        let end = identifier_end(bytes, start)?;
        Some((start, end, end))
    }
}

fn identifier_end(bytes: &[u8], start: usize) -> Option<usize> {
    let first = *bytes.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    Some(start + len)
}

/// Substitution behavior switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstOptions {
    /// Fail on unset variables instead of expanding them to `""`.
    pub strict: bool,
    /// When set, only these names are substituted; other references are
    /// copied through verbatim.
    pub only: Option<BTreeSet<String>>,
}

impl SubstOptions {
    /// Enable or disable strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Restrict substitution to the given names.
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(names.into_iter().map(Into::into).collect::<BTreeSet<String>>());
        self
    }

    fn permits(&self, name: &str) -> bool {
        self.only.as_ref().is_none_or(|names| names.contains(name))
    }
}

/// Output of a substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// The expanded text.
    pub text: String,
    /// Variables that were referenced but unset (expanded to `""`).
    pub unresolved: BTreeSet<String>,
}

/// An environment paired with options: the substitution tool.
#[derive(Debug, Clone, Default)]
pub struct Substituter {
    env: Environment,
    options: SubstOptions,
}

impl Substituter {
    pub fn new(env: Environment, options: SubstOptions) -> Self {
        Substituter { env, options }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn options(&self) -> &SubstOptions {
        &self.options
    }

    /// A substituter that additionally binds `name` to `value`.
    pub fn bind(&self, name: &str, value: &str) -> Substituter {
        Substituter {
            env: self.env.with(name, value),
            options: self.options.clone(),
        }
    }

    pub fn substitute(&self, src: &str) -> Result<Rendered> {
        Template::parse(src).render(&self.env, &self.options)
    }

    /// Substitute raw file contents, rejecting non-UTF-8 input.
    pub fn substitute_bytes(&self, src: &[u8]) -> Result<Rendered> {
        self.substitute(std::str::from_utf8(src)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        [
            ("AWS_REGION", "us-west-2"),
            ("NETWORK", "mainnet"),
            ("EMPTY", ""),
        ]
        .into_iter()
        .collect()
    }

    fn render(src: &str) -> Rendered {
        Substituter::new(env(), SubstOptions::default())
            .substitute(src)
            .unwrap()
    }

    #[test]
    fn plain_and_braced_references() {
        let out = render("a=$AWS_REGION b=${NETWORK}");
        assert_eq!(out.text, "a=us-west-2 b=mainnet");
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn braced_reference_may_abut_identifier_text() {
        assert_eq!(render("${NETWORK}_ami").text, "mainnet_ami");
        // Unbraced form takes the longest identifier.
        assert_eq!(render("$NETWORK_ami").text, "");
    }

    #[test]
    fn hcl_interpolations_pass_through() {
        let src = r#"ami_name = "node-${var.version}-${local.ts}""#;
        assert_eq!(render(src).text, src);
    }

    #[test]
    fn lone_and_trailing_dollars_are_literal() {
        assert_eq!(render("cost: $5 and $").text, "cost: $5 and $");
        assert_eq!(render("${").text, "${");
        assert_eq!(render("${AWS_REGION").text, "${AWS_REGION");
        assert_eq!(render("${}").text, "${}");
    }

    #[test]
    fn double_dollar_expands_second() {
        assert_eq!(render("$$AWS_REGION").text, "$us-west-2");
    }

    #[test]
    fn unset_expands_to_empty_and_is_reported() {
        let out = render("x=[$MISSING] y=[${ALSO_MISSING}] z=[$EMPTY]");
        assert_eq!(out.text, "x=[] y=[] z=[]");
        let names: Vec<_> = out.unresolved.iter().map(String::as_str).collect();
        assert_eq!(names, ["ALSO_MISSING", "MISSING"]);
    }

    #[test]
    fn strict_mode_rejects_unset() {
        let sub = Substituter::new(env(), SubstOptions::default().strict(true));
        let err = sub.substitute("region=$AWS_REGION id=$SOURCE_AMI").unwrap_err();
        assert!(matches!(err, TemplateError::Undefined { ref name } if name == "SOURCE_AMI"));
        // Empty is still set.
        assert_eq!(sub.substitute("[$EMPTY]").unwrap().text, "[]");
    }

    #[test]
    fn allow_list_limits_substitution() {
        let sub = Substituter::new(env(), SubstOptions::default().only(["AWS_REGION"]));
        let out = sub.substitute("$AWS_REGION $NETWORK ${HOME}").unwrap();
        assert_eq!(out.text, "us-west-2 $NETWORK ${HOME}");
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn bind_overrides_for_one_call_site() {
        let sub = Substituter::new(env(), SubstOptions::default());
        let bound = sub.bind("AWS_REGION", "ap-south-1");
        assert_eq!(bound.substitute("$AWS_REGION").unwrap().text, "ap-south-1");
        assert_eq!(sub.substitute("$AWS_REGION").unwrap().text, "us-west-2");
    }

    #[test]
    fn non_ascii_text_survives() {
        assert_eq!(render("région → $NETWORK ✓").text, "région → mainnet ✓");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let sub = Substituter::new(env(), SubstOptions::default());
        let err = sub.substitute_bytes(&[b'$', b'A', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, TemplateError::Encoding(_)));
    }

    #[test]
    fn variables_lists_references_once() {
        let t = Template::parse("$B ${A} $B ${var.x} $");
        let vars: Vec<_> = t.variables().into_iter().collect();
        assert_eq!(vars, ["A", "B"]);
        assert_eq!(t.segments().len(), 6);
    }
}
