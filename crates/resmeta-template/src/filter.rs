//! Filtering context decorators
//!
//! A [`FilteringContext`] wraps another [`StatementContext`] and lets a
//! [`Filter`] answer some variables before the delegate is asked. Decorators
//! nest in any order:
//!
//! ```ignore
//! let base: Arc<dyn StatementContext> = Arc::new(SelectionContext::new(mode));
//! let ctx = FilteringContext::wildcard_when_undefined(Arc::new(
//!     FilteringContext::selection_aware(base, move || current.read().clone()),
//! ));
//! ```

use crate::context::StatementContext;
use crate::selection::Tuple;
use crate::template::AddressTemplate;
use resmeta_dmr::Segment;
use resmeta_dmr::model::WILDCARD;
use std::collections::HashSet;
use std::sync::Arc;

/// Variable naming the resource the user currently works with
pub const SELECTION: &str = "selection";

/// Overrides some variables of a delegate context. Returning `None` lets the
/// delegate answer.
pub trait Filter: Send + Sync {
    fn filter(
        &self,
        _variable: &str,
        _template: &AddressTemplate,
        _delegate: &dyn StatementContext,
    ) -> Option<String> {
        None
    }

    fn filter_tuple(
        &self,
        _variable: &str,
        _template: &AddressTemplate,
        _delegate: &dyn StatementContext,
    ) -> Option<Segment> {
        None
    }
}

/// Resolves [`SELECTION`] through an accessor
pub struct SelectionFilter {
    accessor: Box<dyn Fn() -> Option<String> + Send + Sync>,
}

impl SelectionFilter {
    pub fn new(accessor: impl Fn() -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            accessor: Box::new(accessor),
        }
    }
}

impl Filter for SelectionFilter {
    fn filter(
        &self,
        variable: &str,
        _template: &AddressTemplate,
        _delegate: &dyn StatementContext,
    ) -> Option<String> {
        (variable == SELECTION).then(|| (self.accessor)()).flatten()
    }
}

/// Forces every well-known tuple to `<resource>=*`
pub struct WildcardFilter;

impl Filter for WildcardFilter {
    fn filter(
        &self,
        variable: &str,
        _template: &AddressTemplate,
        _delegate: &dyn StatementContext,
    ) -> Option<String> {
        Tuple::from_variable(variable).map(|_| WILDCARD.to_string())
    }

    fn filter_tuple(
        &self,
        variable: &str,
        _template: &AddressTemplate,
        _delegate: &dyn StatementContext,
    ) -> Option<Segment> {
        Tuple::from_variable(variable).map(|tuple| Segment::new(tuple.resource(), WILDCARD))
    }
}

/// Substitutes `*` for well-known tuples and [`SELECTION`] only when the
/// delegate has no value
pub struct WildcardWhenUndefinedFilter;

impl Filter for WildcardWhenUndefinedFilter {
    fn filter(
        &self,
        variable: &str,
        template: &AddressTemplate,
        delegate: &dyn StatementContext,
    ) -> Option<String> {
        let known = variable == SELECTION || Tuple::from_variable(variable).is_some();
        (known && delegate.resolve(variable, template).is_none()).then(|| WILDCARD.to_string())
    }

    fn filter_tuple(
        &self,
        variable: &str,
        template: &AddressTemplate,
        delegate: &dyn StatementContext,
    ) -> Option<Segment> {
        let tuple = Tuple::from_variable(variable)?;
        delegate
            .resolve_tuple(variable, template)
            .is_none()
            .then(|| Segment::new(tuple.resource(), WILDCARD))
    }
}

/// Forces the named value variables to `*`
pub struct ValueWildcardFilter {
    variables: HashSet<String>,
}

impl ValueWildcardFilter {
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for ValueWildcardFilter {
    fn filter(
        &self,
        variable: &str,
        _template: &AddressTemplate,
        _delegate: &dyn StatementContext,
    ) -> Option<String> {
        self.variables
            .contains(variable)
            .then(|| WILDCARD.to_string())
    }
}

/// Statement context decorator
pub struct FilteringContext {
    delegate: Arc<dyn StatementContext>,
    filter: Box<dyn Filter>,
}

impl FilteringContext {
    pub fn new(delegate: Arc<dyn StatementContext>, filter: impl Filter + 'static) -> Self {
        Self {
            delegate,
            filter: Box::new(filter),
        }
    }

    /// Resolve [`SELECTION`] through `accessor`
    pub fn selection_aware(
        delegate: Arc<dyn StatementContext>,
        accessor: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self::new(delegate, SelectionFilter::new(accessor))
    }

    /// Resolve every well-known tuple to a wildcard
    pub fn wildcard(delegate: Arc<dyn StatementContext>) -> Self {
        Self::new(delegate, WildcardFilter)
    }

    /// Resolve well-known tuples and [`SELECTION`] to a wildcard when the
    /// delegate has no value
    pub fn wildcard_when_undefined(delegate: Arc<dyn StatementContext>) -> Self {
        Self::new(delegate, WildcardWhenUndefinedFilter)
    }

    /// Resolve the given value variables to a wildcard
    pub fn value_wildcards<I, S>(delegate: Arc<dyn StatementContext>, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(delegate, ValueWildcardFilter::new(variables))
    }
}

impl StatementContext for FilteringContext {
    fn resolve(&self, variable: &str, template: &AddressTemplate) -> Option<String> {
        self.filter
            .filter(variable, template, self.delegate.as_ref())
            .or_else(|| self.delegate.resolve(variable, template))
    }

    fn resolve_tuple(&self, variable: &str, template: &AddressTemplate) -> Option<Segment> {
        self.filter
            .filter_tuple(variable, template, self.delegate.as_ref())
            .or_else(|| self.delegate.resolve_tuple(variable, template))
    }

    fn collect(&self, variable: &str, template: &AddressTemplate) -> Vec<String> {
        let mut values = self.delegate.collect(variable, template);
        if let Some(own) = self.filter.filter(variable, template, self.delegate.as_ref()) {
            values.push(own);
        }
        values
    }

    fn collect_tuples(&self, variable: &str, template: &AddressTemplate) -> Vec<Segment> {
        let mut tuples = self.delegate.collect_tuples(variable, template);
        if let Some(own) = self
            .filter
            .filter_tuple(variable, template, self.delegate.as_ref())
        {
            tuples.push(own);
        }
        tuples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BaseContext;
    use crate::selection::SelectionContext;
    use parking_lot::RwLock;
    use resmeta_common::OperationMode;

    fn t(text: &str) -> AddressTemplate {
        AddressTemplate::parse(text).unwrap()
    }

    fn selection() -> Arc<SelectionContext> {
        Arc::new(SelectionContext::new(OperationMode::Domain))
    }

    #[test]
    fn test_selection_aware() {
        let current = Arc::new(RwLock::new(Some("ExampleDS".to_string())));
        let accessor = {
            let current = Arc::clone(&current);
            move || current.read().clone()
        };
        let ctx = FilteringContext::selection_aware(Arc::new(BaseContext::Empty), accessor);
        let at = t("subsystem=datasources/data-source={selection}");
        assert_eq!(
            at.resolve(&ctx).to_string(),
            "/subsystem=datasources/data-source=ExampleDS"
        );

        *current.write() = None;
        assert_eq!(
            at.resolve(&ctx).to_string(),
            "/subsystem=datasources/data-source=_blank"
        );
    }

    #[test]
    fn test_wildcard_overrides_selection() {
        let base = selection();
        base.select(Tuple::SelectedProfile, "full");
        let ctx = FilteringContext::wildcard(base);
        let at = t("{selected.profile}/subsystem=mail");
        assert_eq!(at.resolve(&ctx).to_string(), "/profile=*/subsystem=mail");
    }

    #[test]
    fn test_wildcard_when_undefined() {
        let base = selection();
        let ctx = FilteringContext::wildcard_when_undefined(base.clone());
        let at = t("{selected.host}/{selected.server}/subsystem=jmx");
        assert_eq!(at.resolve(&ctx).to_string(), "/host=*/server=*/subsystem=jmx");

        base.select(Tuple::SelectedHost, "primary");
        assert_eq!(
            at.resolve(&ctx).to_string(),
            "/host=primary/server=*/subsystem=jmx"
        );
    }

    #[test]
    fn test_wildcard_when_undefined_selection_value() {
        let ctx = FilteringContext::wildcard_when_undefined(Arc::new(BaseContext::Empty));
        let at = t("subsystem=logging/logger={selection}");
        assert_eq!(at.resolve(&ctx).to_string(), "/subsystem=logging/logger=*");
    }

    #[test]
    fn test_value_wildcards() {
        let ctx = FilteringContext::value_wildcards(Arc::new(BaseContext::Echo), ["name"]);
        let at = t("a={name}/b={other}");
        assert_eq!(at.resolve(&ctx).to_string(), "/a=*/b=other");
    }

    #[test]
    fn test_decorators_compose_in_any_order() {
        let base = selection();
        let accessor = || Some("ExampleDS".to_string());
        let at = t("{selected.profile}/subsystem=datasources/data-source={selection}");

        let a = FilteringContext::wildcard(Arc::new(FilteringContext::selection_aware(
            base.clone(),
            accessor,
        )));
        let b = FilteringContext::selection_aware(Arc::new(FilteringContext::wildcard(base)), accessor);

        let expected = "/profile=*/subsystem=datasources/data-source=ExampleDS";
        assert_eq!(at.resolve(&a).to_string(), expected);
        assert_eq!(at.resolve(&b).to_string(), expected);
    }

    #[test]
    fn test_most_specific_decorator_consumed_first() {
        let base = selection();
        base.select(Tuple::SelectedHost, "primary");
        let ctx = FilteringContext::wildcard(base);
        let at = t("{selected.host}/{selected.host}");
        assert_eq!(at.resolve(&ctx).to_string(), "/host=*/host=primary");
    }
}
