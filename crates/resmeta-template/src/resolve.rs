use crate::context::StatementContext;
use crate::template::{AddressTemplate, variable_name};
use resmeta_dmr::ResourceAddress;
use resmeta_dmr::model::WILDCARD;
use std::collections::HashMap;
use tracing::warn;

/// Substituted for keys and values the context cannot resolve
pub const BLANK: &str = "_blank";

/// Candidates per variable for one resolve call, consumed back to front
struct Memory<T> {
    values: HashMap<String, Vec<T>>,
}

impl<T> Memory<T> {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    fn next(&mut self, variable: &str, load: impl FnOnce() -> Vec<T>) -> Option<T> {
        if !self.values.contains_key(variable) {
            let loaded = load();
            if loaded.is_empty() {
                return None;
            }
            self.values.insert(variable.to_string(), loaded);
        }
        self.values.get_mut(variable).and_then(Vec::pop)
    }
}

impl AddressTemplate {
    /// Resolve this template against `context`
    #[must_use]
    pub fn resolve(&self, context: &dyn StatementContext) -> ResourceAddress {
        self.resolve_with::<&str>(context, &[])
    }

    /// Resolve this template, replacing `*` values left to right with the
    /// given wildcard values
    #[must_use]
    pub fn resolve_with<S: AsRef<str>>(
        &self,
        context: &dyn StatementContext,
        wildcards: &[S],
    ) -> ResourceAddress {
        let mut address = ResourceAddress::root();
        let mut wildcards = wildcards.iter();
        let mut tuples = Memory::new();
        let mut values = Memory::new();

        for token in self.tokens() {
            let Some(key) = token.key() else {
                match variable_name(token.value()) {
                    Some(name) => {
                        match tuples.next(name, || context.collect_tuples(name, self)) {
                            Some(tuple) => {
                                address.add(tuple.key, tuple.value);
                            }
                            None => warn!("Unable to resolve tuple {{{}}} in {}", name, self),
                        }
                    }
                    None => {
                        if let Some((k, v)) = token.value().split_once('=') {
                            address.add(k, v);
                        }
                    }
                }
                continue;
            };

            let resolved_key = self
                .resolve_part(context, &mut values, key)
                .unwrap_or_else(|| BLANK.to_string());
            let mut resolved_value = self
                .resolve_part(context, &mut values, token.value())
                .unwrap_or_else(|| BLANK.to_string());
            if resolved_value == WILDCARD
                && let Some(replacement) = wildcards.next()
            {
                resolved_value = replacement.as_ref().to_string();
            }
            address.add(resolved_key, resolved_value);
        }
        address
    }

    fn resolve_part(
        &self,
        context: &dyn StatementContext,
        memory: &mut Memory<String>,
        part: &str,
    ) -> Option<String> {
        match variable_name(part) {
            Some(name) => memory.next(name, || context.collect(name, self)),
            None => Some(part.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BaseContext;
    use crate::template::Token;
    use resmeta_dmr::Segment;

    fn t(text: &str) -> AddressTemplate {
        AddressTemplate::parse(text).unwrap()
    }

    /// Context answering from fixed candidate lists
    struct ListContext {
        values: Vec<(&'static str, Vec<&'static str>)>,
        tuples: Vec<(&'static str, Vec<(&'static str, &'static str)>)>,
    }

    impl StatementContext for ListContext {
        fn resolve(&self, variable: &str, template: &AddressTemplate) -> Option<String> {
            self.collect(variable, template).pop()
        }

        fn resolve_tuple(&self, variable: &str, template: &AddressTemplate) -> Option<Segment> {
            self.collect_tuples(variable, template).pop()
        }

        fn collect(&self, variable: &str, _template: &AddressTemplate) -> Vec<String> {
            self.values
                .iter()
                .filter(|(name, _)| *name == variable)
                .flat_map(|(_, values)| values.iter().map(ToString::to_string))
                .collect()
        }

        fn collect_tuples(&self, variable: &str, _template: &AddressTemplate) -> Vec<Segment> {
            self.tuples
                .iter()
                .filter(|(name, _)| *name == variable)
                .flat_map(|(_, tuples)| tuples.iter().map(|(k, v)| Segment::new(*k, *v)))
                .collect()
        }
    }

    #[test]
    fn test_resolve_root() {
        assert!(AddressTemplate::ROOT.resolve(&BaseContext::Echo).is_root());
    }

    #[test]
    fn test_resolve_echo() {
        let address = t("{a}/b={c}").resolve(&BaseContext::Echo);
        assert_eq!(address.to_string(), "/a=a/b=c");
    }

    #[test]
    fn test_resolve_wildcards() {
        let at = t("a=*/c=*");
        let ctx = BaseContext::Echo;
        assert_eq!(at.resolve(&ctx).to_string(), "/a=*/c=*");
        assert_eq!(at.resolve_with(&ctx, &["b"]).to_string(), "/a=b/c=*");
        assert_eq!(at.resolve_with(&ctx, &["b", "d"]).to_string(), "/a=b/c=d");
        assert_eq!(
            at.resolve_with(&ctx, &["b", "d", "foo"]).to_string(),
            "/a=b/c=d"
        );
    }

    #[test]
    fn test_resolve_host_server_config_wildcards() {
        let address = t("host=*/server-config=*").resolve_with(&BaseContext::Empty, &["host1", "serverA"]);
        assert_eq!(address.to_string(), "/host=host1/server-config=serverA");
    }

    #[test]
    fn test_resolve_profile_tuple() {
        let ctx = ListContext {
            values: vec![],
            tuples: vec![("selected.profile", vec![("profile", "default")])],
        };
        let address = t("{selected.profile}/subsystem=mail").resolve(&ctx);
        assert_eq!(address.to_string(), "/profile=default/subsystem=mail");
    }

    #[test]
    fn test_unresolved_parts_become_blank() {
        let address = t("{a}=b/c={d}").resolve(&BaseContext::Empty);
        assert_eq!(address.to_string(), "/_blank=b/c=_blank");
    }

    #[test]
    fn test_unresolved_tuple_suppressed() {
        let address = t("{selected.host}/subsystem=jmx").resolve(&BaseContext::Empty);
        assert_eq!(address.to_string(), "/subsystem=jmx");
    }

    #[test]
    fn test_candidates_consumed_back_to_front() {
        let ctx = ListContext {
            values: vec![("name", vec!["outer", "inner"])],
            tuples: vec![("selected.host", vec![("host", "general"), ("host", "specific")])],
        };
        let address = t("{selected.host}/a={name}/{selected.host}/b={name}/c={name}").resolve(&ctx);
        assert_eq!(
            address.to_string(),
            "/host=specific/a=inner/host=general/b=outer/c=_blank"
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let ctx = BaseContext::Echo;
        let at = t("{selected.profile}/subsystem=logging/logger={selection}");
        assert_eq!(at.resolve(&ctx), at.resolve(&ctx));
    }

    #[test]
    fn test_bare_literal_token() {
        let at = AddressTemplate::from_tokens(vec![Token::bare("a=b"), Token::keyed("c", "d")], false);
        assert_eq!(at.resolve(&BaseContext::Empty).to_string(), "/a=b/c=d");
    }
}
