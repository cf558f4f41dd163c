//! Type stubs for the libraries the recipes migrate from and to.
//!
//! Each [`Artifact`] is a bundle of bodiless Java signatures compiled into
//! the binary. Recipes only ever see types through a [`Classpath`], so a
//! source that refers to a class missing here attributes to `Unknown` and
//! is left alone.

use core::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use rewrite_apache_core::classpath::Classpath;
use rewrite_apache_core::errors::ClasspathError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// commons-lang, commons-lang3, commons-text and maven-shared-utils
    /// `StringUtils`.
    CommonsLang,
    CommonsIo,
    CommonsCodec,
    /// plexus-utils and the plexus container logging API.
    Plexus,
    Slf4j,
    Poi,
    /// httpcore 4, httpcore-nio 4, httpclient 4 and httpasyncclient 4.
    HttpClient4,
    /// httpcore5 and httpclient5.
    HttpClient5,
}

impl Artifact {
    pub const ALL: [Artifact; 8] = [
        Artifact::CommonsLang,
        Artifact::CommonsIo,
        Artifact::CommonsCodec,
        Artifact::Plexus,
        Artifact::Slf4j,
        Artifact::Poi,
        Artifact::HttpClient4,
        Artifact::HttpClient5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Artifact::CommonsLang => "commons-lang",
            Artifact::CommonsIo => "commons-io",
            Artifact::CommonsCodec => "commons-codec",
            Artifact::Plexus => "plexus-utils",
            Artifact::Slf4j => "slf4j-api",
            Artifact::Poi => "poi",
            Artifact::HttpClient4 => "httpclient-4",
            Artifact::HttpClient5 => "httpclient5",
        }
    }

    /// The stub bundle source.
    pub fn stubs(self) -> &'static str {
        match self {
            Artifact::CommonsLang => include_str!("../resources/commons_lang.java"),
            Artifact::CommonsIo => include_str!("../resources/commons_io.java"),
            Artifact::CommonsCodec => include_str!("../resources/commons_codec.java"),
            Artifact::Plexus => include_str!("../resources/plexus.java"),
            Artifact::Slf4j => include_str!("../resources/slf4j.java"),
            Artifact::Poi => include_str!("../resources/poi.java"),
            Artifact::HttpClient4 => include_str!("../resources/httpclient4.java"),
            Artifact::HttpClient5 => include_str!("../resources/httpclient5.java"),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Artifact {
    type Err = ClasspathError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Artifact::ALL
            .into_iter()
            .find(|artifact| artifact.name() == name)
            .ok_or_else(|| ClasspathError::UnknownArtifact(name.to_string()))
    }
}

/// The JDK subset plus `artifacts`.
pub fn classpath(artifacts: &[Artifact]) -> Result<Arc<Classpath>, ClasspathError> {
    let mut builder = Classpath::builder().with_jdk()?;
    for artifact in artifacts {
        builder = builder.stubs(artifact.name(), artifact.stubs())?;
    }
    let classpath = builder.build();
    debug!(artifacts = artifacts.len(), classes = classpath.len(), "Built classpath");
    Ok(Arc::new(classpath))
}

/// Like [`classpath`], for artifact names such as `"httpclient-4"`.
pub fn classpath_from_names(names: &[&str]) -> Result<Arc<Classpath>, ClasspathError> {
    let artifacts = names
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<Artifact>, _>>()?;
    classpath(&artifacts)
}

static BUNDLED: Lazy<Result<Arc<Classpath>, ClasspathError>> =
    Lazy::new(|| classpath(&Artifact::ALL));

/// Every bundled artifact, built once and shared.
pub fn bundled() -> Result<Arc<Classpath>, ClasspathError> {
    BUNDLED.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bundle_parses() {
        for artifact in Artifact::ALL {
            let result = classpath(&[artifact]);
            assert!(result.is_ok(), "{artifact}: {:?}", result.err());
        }
    }

    #[test]
    fn bundled_classpath_knows_both_http_clients() {
        let classpath = bundled().expect("bundled classpath");
        assert!(classpath.contains("org.apache.http.impl.client.HttpClientBuilder"));
        assert!(classpath.contains("org.apache.hc.client5.http.impl.classic.HttpClientBuilder"));
        assert!(classpath.contains("org.apache.hc.client5.http.config.RequestConfig.Builder"));
        assert!(classpath.is_subtype(
            "org.apache.http.entity.StringEntity",
            "org.apache.http.HttpEntity"
        ));
    }

    #[test]
    fn artifact_names_round_trip() {
        for artifact in Artifact::ALL {
            assert_eq!(artifact.name().parse::<Artifact>().ok(), Some(artifact));
        }
        assert!(matches!(
            "guava".parse::<Artifact>(),
            Err(ClasspathError::UnknownArtifact(name)) if name == "guava"
        ));
    }

    #[test]
    fn classpath_from_names_rejects_unknown_artifacts() {
        assert!(classpath_from_names(&["poi", "slf4j-api"]).is_ok());
        assert!(classpath_from_names(&["poi", "log4j"]).is_err());
    }
}
