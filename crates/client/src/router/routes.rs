//! Compiled route classification table.

use folio_core::{Error, RouteMatcher, RouteSpec, Strategy};
use regex::Regex;
use url::Url;

use crate::fetch::{Request, same_origin};

#[derive(Debug)]
enum Pattern {
    Regex(Regex),
    Path(String),
    Navigate,
    Any,
}

/// A rule after its pattern has been compiled.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub strategy: Strategy,
    pattern: Pattern,
}

impl Route {
    /// Regex rules may match any origin; the others only apply to the
    /// router's own origin.
    fn matches(&self, request: &Request, own_origin: bool) -> bool {
        match &self.pattern {
            Pattern::Regex(re) => re.is_match(request.url.as_str()),
            Pattern::Path(path) => own_origin && request.url.path() == path,
            Pattern::Navigate => own_origin && request.is_navigation(),
            Pattern::Any => own_origin,
        }
    }
}

/// Ordered (pattern, strategy) rules. First match wins.
#[derive(Debug)]
pub struct RouteTable {
    origin: Url,
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile `specs` for a router serving `origin`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoute` naming the first rule whose regex does not compile.
    pub fn compile(origin: &Url, specs: &[RouteSpec]) -> Result<Self, Error> {
        let routes = specs
            .iter()
            .map(|spec| {
                let pattern = match &spec.matcher {
                    RouteMatcher::Regex(src) => Pattern::Regex(
                        Regex::new(src).map_err(|e| Error::InvalidRoute(format!("{}: {e}", spec.name)))?,
                    ),
                    RouteMatcher::Path(path) => Pattern::Path(path.clone()),
                    RouteMatcher::Navigate => Pattern::Navigate,
                    RouteMatcher::Any => Pattern::Any,
                };
                Ok(Route { name: spec.name.clone(), strategy: spec.strategy, pattern })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self { origin: origin.clone(), routes })
    }

    /// First rule matching `request`, or None when the request is outside
    /// the router's scope (a cross-origin URL no rule names).
    pub fn classify(&self, request: &Request) -> Option<&Route> {
        let own_origin = same_origin(&self.origin, &request.url);
        self.routes.iter().find(|route| route.matches(request, own_origin))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::config::default_routes;

    fn table() -> RouteTable {
        RouteTable::compile(&Url::parse("https://jane.dev").unwrap(), &default_routes()).unwrap()
    }

    fn classify(request: Request) -> Option<(String, Strategy)> {
        table().classify(&request).map(|r| (r.name.clone(), r.strategy))
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_api_is_network_first() {
        let hit = classify(get("https://api.github.com/users/x")).unwrap();
        assert_eq!(hit, ("api".to_string(), Strategy::NetworkFirst));
    }

    #[test]
    fn test_api_wins_over_image_extension() {
        let hit = classify(get("https://api.github.com/avatars/x.png")).unwrap();
        assert_eq!(hit.1, Strategy::NetworkFirst);
    }

    #[test]
    fn test_images_are_cache_first() {
        assert_eq!(classify(get("https://jane.dev/nonexistent.png")).unwrap().1, Strategy::CacheFirst);
        assert_eq!(classify(get("https://jane.dev/hero.JPG?w=640")).unwrap().1, Strategy::CacheFirst);
        assert_eq!(
            classify(get("https://avatars.githubusercontent.com/u/1.webp")).unwrap().1,
            Strategy::CacheFirst
        );
    }

    #[test]
    fn test_fonts_and_cdn_revalidate() {
        for url in [
            "https://fonts.googleapis.com/css2?family=Inter",
            "https://fonts.gstatic.com/s/inter/v12/a.woff2",
            "https://cdn.jsdelivr.net/npm/aos@2/dist/aos.css",
        ] {
            assert_eq!(classify(get(url)).unwrap().1, Strategy::StaleWhileRevalidate, "{url}");
        }
    }

    #[test]
    fn test_navigation_uses_offline_fallback() {
        let hit = classify(Request::navigate(Url::parse("https://jane.dev/").unwrap())).unwrap();
        assert_eq!(hit, ("navigation".to_string(), Strategy::NetworkFirstOffline));
    }

    #[test]
    fn test_same_origin_default() {
        let hit = classify(get("https://jane.dev/assets/index-3f2a.js")).unwrap();
        assert_eq!(hit, ("default".to_string(), Strategy::NetworkFirst));
    }

    #[test]
    fn test_unlisted_cross_origin_is_out_of_scope() {
        assert!(classify(get("https://www.google-analytics.com/g/collect")).is_none());
    }

    #[test]
    fn test_path_rule() {
        let specs = vec![RouteSpec::new(
            "resume",
            RouteMatcher::Path("/resume.pdf".into()),
            Strategy::CacheFirst,
        )];
        let table = RouteTable::compile(&Url::parse("https://jane.dev").unwrap(), &specs).unwrap();
        assert!(table.classify(&get("https://jane.dev/resume.pdf")).is_some());
        assert!(table.classify(&get("https://jane.dev/resume.pdf.bak")).is_none());
        assert!(table.classify(&get("https://other.dev/resume.pdf")).is_none());
    }

    #[test]
    fn test_invalid_regex() {
        let specs = vec![RouteSpec::new("broken", RouteMatcher::Regex("([".into()), Strategy::CacheFirst)];
        let result = RouteTable::compile(&Url::parse("https://jane.dev").unwrap(), &specs);
        assert!(matches!(result, Err(Error::InvalidRoute(msg)) if msg.starts_with("broken")));
    }
}
