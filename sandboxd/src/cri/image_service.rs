/* -------------------------------------------------------------------------- *\
 *                |   █████╗ ██╗   ██╗██████╗  █████╗ ███████╗ |              *
 *                |  ██╔══██╗██║   ██║██╔══██╗██╔══██╗██╔════╝ |              *
 *                |  ███████║██║   ██║██████╔╝███████║█████╗   |              *
 *                |  ██╔══██║██║   ██║██╔══██╗██╔══██║██╔══╝   |              *
 *                |  ██║  ██║╚██████╔╝██║  ██║██║  ██║███████╗ |              *
 *                |  ╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝ |              *
 *                +--------------------------------------------+              *
 *                                                                            *
 *                         Distributed Systems Runtime                        *
 * -------------------------------------------------------------------------- *
 * Copyright 2022 - 2024, the aurae contributors                              *
 * SPDX-License-Identifier: Apache-2.0                                        *
\* -------------------------------------------------------------------------- */

use super::{
    error::{Result, SandboxServiceError},
    image_store::{CanPull, DockerAuthConfig, ImageStore, PullOptions},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{fmt::Debug, sync::Arc};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSpec {
    pub image: String,
}

/// Registry credentials as sent by the client. A non-empty `auth` (base64 of
/// `user:password`) takes precedence over `username` and `password`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub auth: String,
}

impl Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullImageRequest {
    pub image: Option<ImageSpec>,
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullImageResponse {
    pub image_ref: String,
}

#[derive(Debug, Clone)]
pub struct ImageService {
    store: Arc<dyn ImageStore>,
}

impl ImageService {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    /// Makes sure `request.image` is in the local store and returns its
    /// reference.
    ///
    /// The remote image is only fetched when it differs from the stored one,
    /// compared by config digest. Images without a config digest (schema1
    /// manifests) are always pulled again.
    #[tracing::instrument(skip(self))]
    pub async fn pull_image(
        &self,
        request: PullImageRequest,
    ) -> Result<PullImageResponse> {
        debug!("PullImageRequest: {request:?}");

        let image =
            request.image.map(|spec| spec.image).unwrap_or_default();

        let (username, password) = match request.auth {
            Some(auth) if !auth.auth.is_empty() => decode_docker_auth(&auth.auth)?,
            Some(auth) => (auth.username, auth.password),
            None => (String::new(), String::new()),
        };

        // the username alone decides whether credentials are sent
        let options = PullOptions {
            auth: (!username.is_empty())
                .then(|| DockerAuthConfig { username, password }),
        };

        match self.store.can_pull(&image, &options).await {
            CanPull { allowed: false, error: Some(source) } => {
                return Err(SandboxServiceError::PullNotPermitted {
                    image,
                    source,
                });
            }
            CanPull { error: Some(e), .. } => {
                debug!("pull gate for {image} reported an error, pulling anyway: {e}");
            }
            CanPull { error: None, .. } => {}
        }

        if !self.is_up_to_date(&image, &options).await {
            let _ = self.store.pull_image(&image, &options).await.map_err(
                |source| SandboxServiceError::PullFailed {
                    image: image.clone(),
                    source,
                },
            )?;
        }

        let response = PullImageResponse { image_ref: image };
        debug!("PullImageResponse: {response:?}");
        Ok(response)
    }

    /// True only if the stored image provably has the remote's content.
    async fn is_up_to_date(&self, image: &str, options: &PullOptions) -> bool {
        let stored = match self.store.image_status(image).await {
            Ok(stored) => stored,
            Err(e) => {
                debug!("image {image} not in store: {e}");
                return false;
            }
        };

        let prepared = match self.store.prepare_image(image, options).await {
            Ok(prepared) => prepared,
            Err(e) => {
                debug!("failed to inspect remote image {image}, re-pulling: {e}");
                return false;
            }
        };

        if prepared.config_digest.is_empty() {
            debug!("image config digest is empty, re-pulling image");
            return false;
        }
        if prepared.config_digest == stored.config_digest {
            debug!("image {image} already in store, skipping pull");
            return true;
        }

        debug!("image in store has different ID, re-pulling {image}");
        false
    }
}

/// Decodes a docker style `auth` blob into username and password.
///
/// A blob without a `:` yields empty credentials rather than an error.
/// Padding NUL bytes are trimmed from the password.
pub fn decode_docker_auth(auth: &str) -> Result<(String, String)> {
    let decoded = STANDARD
        .decode(auth)
        .map_err(|source| SandboxServiceError::AuthDecode { source })?;
    let decoded = String::from_utf8(decoded)
        .map_err(|source| SandboxServiceError::AuthNotUtf8 { source })?;

    match decoded.split_once(':') {
        Some((username, password)) => Ok((
            username.to_string(),
            password.trim_matches('\0').to_string(),
        )),
        None => Ok((String::new(), String::new())),
    }
}
