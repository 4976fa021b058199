use std::thread;

use becom_contracts::domain::{GrowthMap, PlanSuggestion};
use reqwest::Url;
use tracing::debug;

use crate::fetcher::ImageFetcher;
use crate::prompts;
use crate::providers::AspectRatio;

const KHAN_SEARCH: &str = "https://www.khanacademy.org/search";
const KHAN_QUERY_MARKER: &str = "search?page_search_query=";

/// Points Khan Academy suggestions without a search URL at a title search.
pub fn rewrite_khan_urls(courses: &mut [PlanSuggestion]) -> usize {
    let mut rewritten = 0;
    for course in courses.iter_mut() {
        let is_khan = course
            .platform
            .as_deref()
            .is_some_and(|platform| platform.to_lowercase().contains("khan"));
        if !is_khan || course.url.contains(KHAN_QUERY_MARKER) {
            continue;
        }
        let Ok(url) = Url::parse_with_params(KHAN_SEARCH, &[("page_search_query", &course.title)])
        else {
            continue;
        };
        debug!(title = %course.title, from = %course.url, "rewriting khan academy link");
        course.url = url.to_string();
        rewritten += 1;
    }
    rewritten
}

/// Fetches every node icon concurrently and writes each result back to its node.
pub fn attach_icons(map: &mut GrowthMap, fetcher: &ImageFetcher) {
    let icon_prompts: Vec<String> = map
        .nodes()
        .map(|node| prompts::growth_icon(&node.image_prompt))
        .collect();
    let urls: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = icon_prompts
            .iter()
            .map(|prompt| scope.spawn(move || fetcher.fetch(prompt, AspectRatio::Square)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_default())
            .collect()
    });
    for (node, url) in map.nodes_mut().zip(urls) {
        node.image_url = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use becom_contracts::domain::GrowthMapNode;

    use super::*;
    use crate::fetcher::testing::{RecordingPacer, ScriptedImages};
    use crate::fetcher::RetryPolicy;

    fn course(title: &str, platform: Option<&str>, url: &str) -> PlanSuggestion {
        PlanSuggestion {
            title: title.to_string(),
            description: String::new(),
            platform: platform.map(str::to_string),
            url: url.to_string(),
        }
    }

    fn node(title: &str, prompt: &str) -> GrowthMapNode {
        GrowthMapNode {
            title: title.to_string(),
            image_prompt: prompt.to_string(),
            image_url: None,
        }
    }

    #[test]
    fn khan_links_become_title_searches() {
        let mut courses = vec![
            course("Marine Biology", Some("Khan Academy"), "https://www.khanacademy.org/science"),
            course("Ocean Life", Some("khan"), "https://www.khanacademy.org/search?page_search_query=ocean"),
            course("Sea Camp", Some("Outschool"), "https://outschool.com/sea"),
            course("No Platform", None, "https://example.com"),
        ];
        assert_eq!(rewrite_khan_urls(&mut courses), 1);
        assert_eq!(
            courses[0].url,
            "https://www.khanacademy.org/search?page_search_query=Marine+Biology"
        );
        assert_eq!(
            courses[1].url,
            "https://www.khanacademy.org/search?page_search_query=ocean"
        );
        assert_eq!(courses[2].url, "https://outschool.com/sea");
        assert_eq!(courses[3].url, "https://example.com");
    }

    #[test]
    fn icons_land_on_their_own_nodes() {
        let images = Arc::new(ScriptedImages::default());
        let fetcher = ImageFetcher::new(images.clone(), RetryPolicy::default())
            .with_pacer(Arc::new(RecordingPacer::default()));
        let mut map = GrowthMap {
            central_node: node("Astronaut", "a rocket"),
            trait_nodes: vec![node("Curious", "a magnifying glass"), node("Brave", "a shield")],
        };

        attach_icons(&mut map, &fetcher);

        assert_eq!(images.calls().len(), 3);
        for current in map.nodes() {
            let expected = crate::providers::GeneratedImage {
                bytes: prompts::growth_icon(&current.image_prompt).into_bytes(),
                mime_type: "image/png".to_string(),
            }
            .to_data_url();
            assert_eq!(current.image_url.as_deref(), Some(expected.as_str()));
        }
    }
}
