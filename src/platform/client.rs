use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    types::AssignmentPage, Assessment, Assignment, CookieJar, Course, CourseDetails, LectureSlot,
    Performance, PlatformApi, Playground, TimeWindow,
};

/// `reqwest` client for the platform's versioned REST API.
#[derive(Clone)]
pub struct NewtonClient {
    http: Client,
    base_url: String,
}

impl NewtonClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build platform http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        cookies: &CookieJar,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        debug!(path, "platform GET");
        let res = self
            .http
            .get(self.url(path))
            .header(header::COOKIE, cookie_header(cookies))
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?
            .error_for_status()
            .with_context(|| format!("GET {path}"))?;
        res.json::<T>()
            .await
            .with_context(|| format!("decode {path}"))
    }
}

pub(crate) fn cookie_header(cookies: &CookieJar) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl PlatformApi for NewtonClient {
    async fn user_info(&self, cookies: &CookieJar) -> anyhow::Result<serde_json::Value> {
        self.get_json(cookies, "/api/v1/user/me/", &[]).await
    }

    async fn courses(&self, cookies: &CookieJar) -> anyhow::Result<Vec<Course>> {
        self.get_json(
            cookies,
            "/api/v2/course/all/applied/",
            &[
                ("pagination", "false".into()),
                ("completed", "false".into()),
            ],
        )
        .await
    }

    async fn course_details(&self, cookies: &CookieJar, course: &str) -> anyhow::Result<CourseDetails> {
        self.get_json(cookies, &format!("/api/v2/course/h/{course}/"), &[])
            .await
    }

    async fn assignments(
        &self,
        cookies: &CookieJar,
        course: &str,
        limit: u32,
        offset: u32,
    ) -> anyhow::Result<Vec<Assignment>> {
        let page: AssignmentPage = self
            .get_json(
                cookies,
                &format!("/api/v2/course/h/{course}/assignment/all/"),
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        Ok(page.into_vec())
    }

    async fn assignment_details(
        &self,
        cookies: &CookieJar,
        course: &str,
        assignment: &str,
    ) -> anyhow::Result<Assignment> {
        self.get_json(
            cookies,
            &format!("/api/v2/course/h/{course}/assignment/h/{assignment}/"),
            &[],
        )
        .await
    }

    async fn assessment_questions(
        &self,
        cookies: &CookieJar,
        course: &str,
        assessment: &str,
    ) -> anyhow::Result<Assessment> {
        self.get_json(
            cookies,
            &format!("/api/v1/course/h/{course}/assessment/h/{assessment}/"),
            &[],
        )
        .await
    }

    async fn lecture_slots(
        &self,
        cookies: &CookieJar,
        course: &str,
        window: TimeWindow,
    ) -> anyhow::Result<Vec<LectureSlot>> {
        self.get_json(
            cookies,
            &format!("/api/v2/course/h/{course}/lecture_slot/all/"),
            &[
                ("pagination", "false".into()),
                ("start_timestamp", window.start.to_string()),
                ("end_timestamp", window.end.to_string()),
            ],
        )
        .await
    }

    async fn coding_playground(
        &self,
        cookies: &CookieJar,
        course: &str,
        playground: &str,
    ) -> anyhow::Result<Playground> {
        self.get_json(
            cookies,
            &format!("/api/v1/course/h/{course}/playground/coding/h/{playground}/"),
            &[],
        )
        .await
    }

    async fn frontend_playground(
        &self,
        cookies: &CookieJar,
        course: &str,
        playground: &str,
    ) -> anyhow::Result<Playground> {
        self.get_json(
            cookies,
            &format!("/api/v1/course/h/{course}/playground/front_end/h/{playground}/"),
            &[],
        )
        .await
    }

    async fn performance(&self, cookies: &CookieJar, course: &str) -> anyhow::Result<Performance> {
        self.get_json(
            cookies,
            &format!("/api/v2/course/h/{course}/user/performance/"),
            &[],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_joins_pairs() {
        let mut jar = CookieJar::new();
        jar.insert("sessionid".into(), "abc".into());
        jar.insert("csrftoken".into(), "xyz".into());
        assert_eq!(cookie_header(&jar), "csrftoken=xyz; sessionid=abc");
        assert_eq!(cookie_header(&CookieJar::new()), "");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = NewtonClient::new("https://my.newtonschool.co/").unwrap();
        assert_eq!(
            client.url("/api/v1/user/me/"),
            "https://my.newtonschool.co/api/v1/user/me/"
        );
    }
}
