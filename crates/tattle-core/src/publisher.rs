//! Gossip publisher.
//!
//! Turns an accepted story candidate into a published Story plus its
//! tabloid GossipArticle, and keeps the trending-tags aggregate current.
//! Also hosts the simpler operator-triggered "instant gossip" path
//! (roast / ship / hype) that fabricates an article without a mined story
//! behind it.
//!
//! No transaction spans the create-story -> create-article -> upsert-trend
//! sequence; a failure partway through leaves earlier writes in place and
//! is logged by the caller. Orphaned Story rows without an article are an
//! accepted outcome.

use chrono::Utc;
use serde::Deserialize;

use tattle_types::actor::{Actor, ActorId};
use tattle_types::error::GossipError;
use tattle_types::gateway::GenerateOptions;
use tattle_types::gossip::{GossipArticle, GossipId, GossipKind};
use tattle_types::story::{Story, StoryCandidate, StoryCategory, StoryId};

use crate::gateway::{CredentialSource, ModelGateway};
use crate::modeljson::{self, ParseOutcome};
use crate::repository::actor::ActorRepository;
use crate::repository::gossip::GossipRepository;
use crate::repository::story::StoryRepository;
use crate::repository::trend::TrendRepository;

/// Auto-publication bar applied by the orchestrating flow. Stricter than
/// the miner's floor: candidates in between are returned by the miner but
/// never auto-published.
pub const PUBLISH_CONFIDENCE: f64 = 0.75;

/// Whether the orchestrating flow should auto-publish a mined candidate.
pub fn should_publish(candidate: &StoryCandidate) -> bool {
    candidate.confidence >= PUBLISH_CONFIDENCE
}

/// Result of the instant-gossip path.
#[derive(Debug, Clone)]
pub enum InstantOutcome {
    Published {
        story_id: StoryId,
        article: GossipArticle,
    },
    /// "Ship" was requested but there is nobody to pair the target with.
    /// A valid outcome, not an error.
    NoPairing,
}

/// Article title/body as the model is asked to produce them.
#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Publishes stories and gossip articles.
pub struct GossipPublisher<A, S, Ga, T, C, G>
where
    A: ActorRepository,
    S: StoryRepository,
    Ga: GossipRepository,
    T: TrendRepository,
    C: CredentialSource,
    G: ModelGateway,
{
    actors: A,
    stories: S,
    gossip: Ga,
    trends: T,
    credentials: C,
    gateway: G,
}

impl<A, S, Ga, T, C, G> GossipPublisher<A, S, Ga, T, C, G>
where
    A: ActorRepository,
    S: StoryRepository,
    Ga: GossipRepository,
    T: TrendRepository,
    C: CredentialSource,
    G: ModelGateway,
{
    pub fn new(actors: A, stories: S, gossip: Ga, trends: T, credentials: C, gateway: G) -> Self {
        Self {
            actors,
            stories,
            gossip,
            trends,
            credentials,
            gateway,
        }
    }

    /// Persist an accepted candidate as a published Story, synthesize its
    /// article, and bump the trend tag. Returns the new story's id.
    pub async fn publish(&self, candidate: &StoryCandidate) -> Result<StoryId, GossipError> {
        let resolved = self
            .actors
            .get_by_ids(&candidate.actor_ids)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?;

        let Some((main, others)) = resolved.split_first() else {
            return Err(GossipError::NoActorsResolved);
        };

        let names = joined_names(&resolved);
        let title = candidate
            .title
            .clone()
            .unwrap_or_else(|| candidate.category.default_title(&names));

        let now = Utc::now();
        let story = Story {
            id: StoryId::new(),
            category: candidate.category,
            title,
            summary: candidate.evidence.clone(),
            evidence: candidate.evidence.clone(),
            main_actor_id: main.id,
            other_actor_ids: others.iter().map(|a| a.id).collect(),
            source_message_ids: candidate.message_ids.clone(),
            is_published: true,
            published_at: Some(now),
            fire_count: 0,
            view_count: 0,
            created_at: now,
        };

        let story = self
            .stories
            .create(&story)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?;

        let (article_title, body) = self.compose_article(&names, candidate).await;
        let article = GossipArticle {
            id: GossipId::new(),
            story_id: story.id,
            title: article_title,
            body,
            category: candidate.category,
            debate_transcript: None,
            fire_count: 0,
            view_count: 0,
            removed: false,
            created_at: Utc::now(),
        };

        self.gossip
            .create(&article)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?;

        let tag = format!("#{}{}", main.name, candidate.category.tag_suffix());
        self.trends
            .upsert_increment(&tag, &story.id)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?;

        tracing::info!(story = %story.id, category = %candidate.category, "story published");
        Ok(story.id)
    }

    /// Operator-triggered instant gossip for a target actor.
    pub async fn instant(
        &self,
        target_id: &ActorId,
        kind: GossipKind,
    ) -> Result<InstantOutcome, GossipError> {
        let target = self
            .actors
            .get_by_id(target_id)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?
            .ok_or(GossipError::ActorNotFound)?;

        let (headline, body, co_star) = match kind {
            GossipKind::Roast => {
                let fallback = format!("Shocking! {}'s secret is out!", target.name);
                let headline = self
                    .one_shot_headline(&build_roast_prompt(&target), fallback)
                    .await;
                let body = format!(
                    "Sources say {}'s recent behavior has the entire feed talking...",
                    target.name
                );
                (headline, body, None)
            }
            GossipKind::Ship => {
                let Some(partner) = self
                    .actors
                    .most_recent_active_excluding(&target.id)
                    .await
                    .map_err(|e| GossipError::StorageError(e.to_string()))?
                else {
                    return Ok(InstantOutcome::NoPairing);
                };
                let fallback = format!(
                    "Confirmed! {} and {} might just be an item!",
                    target.name, partner.name
                );
                let headline = self
                    .one_shot_headline(&build_ship_prompt(&target, &partner), fallback)
                    .await;
                let body = format!(
                    "Late-night scoop: whatever is going on between {} and {}, it is not nothing...",
                    target.name, partner.name
                );
                (headline, body, Some(partner))
            }
            GossipKind::Hype => {
                let fallback = format!(
                    "The whole feed is in shock! {}'s activity is off the charts!",
                    target.name
                );
                let headline = self
                    .one_shot_headline(&build_hype_prompt(&target), fallback)
                    .await;
                let body = format!(
                    "Breaking: {}'s activity index just spiked hard -- something big must be brewing...",
                    target.name
                );
                (headline, body, None)
            }
        };

        let debate = self.debate_transcript(&headline).await;

        // Minimal story purely as a join target for the article.
        let now = Utc::now();
        let story = Story {
            id: StoryId::new(),
            category: kind.storage_category(),
            title: headline.clone(),
            summary: body.clone(),
            evidence: body.clone(),
            main_actor_id: target.id,
            other_actor_ids: co_star.iter().map(|a| a.id).collect(),
            source_message_ids: Vec::new(),
            is_published: true,
            published_at: Some(now),
            fire_count: 0,
            view_count: 0,
            created_at: now,
        };

        let story = self
            .stories
            .create(&story)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?;

        let article = GossipArticle {
            id: GossipId::new(),
            story_id: story.id,
            title: headline,
            body,
            category: kind.storage_category(),
            debate_transcript: Some(debate),
            fire_count: 0,
            view_count: 0,
            removed: false,
            created_at: Utc::now(),
        };

        let article = self
            .gossip
            .create(&article)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?;

        let tag = format!("#{}{}", target.name, kind.tag_suffix());
        self.trends
            .upsert_increment(&tag, &story.id)
            .await
            .map_err(|e| GossipError::StorageError(e.to_string()))?;

        Ok(InstantOutcome::Published {
            story_id: story.id,
            article,
        })
    }

    /// Synthesize the article title/body for a mined candidate. Any
    /// failure along the way -- no credential, gateway error, unusable
    /// JSON -- lands on the fixed template.
    async fn compose_article(&self, names: &str, candidate: &StoryCandidate) -> (String, String) {
        let fallback = (
            format!("Shocking! {}", candidate.category.default_title(names)),
            format!(
                "Sources say {names} were at the center of a major incident in the \
                 simulated society. {}. Insiders hint there is far more to this than \
                 meets the eye...",
                candidate.evidence
            ),
        );

        let Some(credential) = self.credentials.any_valid().await else {
            return fallback;
        };

        let prompt = build_article_prompt(candidate.category, names, &candidate.evidence);
        let generation = match self
            .gateway
            .generate(&credential, &prompt, &GenerateOptions::default())
            .await
        {
            Ok(generation) => generation,
            Err(e) => {
                tracing::error!(error = %e, "article synthesis call failed");
                return fallback;
            }
        };

        match modeljson::recover::<RawArticle>(&generation.text) {
            ParseOutcome::Parsed(RawArticle {
                title: Some(title),
                content: Some(content),
            }) => (title, content),
            _ => fallback,
        }
    }

    /// One-shot headline generation with a fixed fallback.
    async fn one_shot_headline(&self, prompt: &str, fallback: String) -> String {
        let Some(credential) = self.credentials.any_valid().await else {
            return fallback;
        };
        match self
            .gateway
            .generate(&credential, prompt, &GenerateOptions::default())
            .await
        {
            Ok(generation) if !generation.text.trim().is_empty() => {
                generation.text.trim().to_string()
            }
            Ok(_) => fallback,
            Err(e) => {
                tracing::error!(error = %e, "headline call failed");
                fallback
            }
        }
    }

    /// Simulated five-persona debate over a topic, with a fixed script
    /// when no credential is available or the call fails.
    async fn debate_transcript(&self, topic: &str) -> String {
        let Some(credential) = self.credentials.any_valid().await else {
            return fallback_debate_script();
        };
        match self
            .gateway
            .generate(&credential, &build_debate_prompt(topic), &GenerateOptions::default())
            .await
        {
            Ok(generation) if !generation.text.trim().is_empty() => generation.text,
            _ => fallback_debate_script(),
        }
    }
}

fn joined_names(actors: &[Actor]) -> String {
    actors
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(" & ")
}

fn fallback_debate_script() -> String {
    "[AcidTongue]: this is completely absurd!\n\
     [Superfan]: I think it's great, actually!\n\
     [Conspiracist]: there has to be something behind this\n\
     [VoiceOfReason]: everyone, let's calm down...\n\
     [Bystander]: grabbing popcorn!"
        .to_string()
}

fn build_article_prompt(category: StoryCategory, names: &str, evidence: &str) -> String {
    format!(
        "Based on the following story from a simulated society of virtual \
         stand-ins, write a shock-style tabloid piece:\n\
         \n\
         Story type: {category}\n\
         Stand-ins involved: {names}\n\
         Evidence:\n\
         {evidence}\n\
         \n\
         Requirements:\n\
         1. The headline must be over-the-top and exaggerated (under 50 words)\n\
         2. The body needs detail and plot (around 200 words)\n\
         3. Keep it funny and entertaining\n\
         4. Lean on phrases like \"sources say\" and \"insiders reveal\"\n\
         \n\
         Return strict JSON -- no Markdown code fences, no newlines, special \
         characters inside strings escaped:\n\
         {{\"title\": \"headline\", \"content\": \"body\"}}\n\
         \n\
         Return a single-line JSON string only."
    )
}

fn build_roast_prompt(target: &Actor) -> String {
    format!(
        "You are a sharp-tongued entertainment reporter. Rewrite this \
         user's info as an over-the-top roast headline:\n\
         \n\
         Name: {}\n\
         About: {}\n\
         Interests: {}\n\
         \n\
         Rules:\n\
         1. Exaggerated and attention-grabbing\n\
         2. Use exclamation marks and meme slang\n\
         3. Funny, never cruel\n\
         4. Under 50 words\n\
         \n\
         Return only the headline, nothing else.",
        target.name,
        target.persona,
        if target.interests.is_empty() {
            "none".to_string()
        } else {
            target.interests.join(", ")
        },
    )
}

fn build_ship_prompt(target: &Actor, partner: &Actor) -> String {
    format!(
        "You are a gossip reporter who lives to ship people. Given these \
         two users, invent a headline claiming they are an item:\n\
         \n\
         User A: {}, interests: {}\n\
         User B: {}, interests: {}\n\
         \n\
         Rules:\n\
         1. Force a common thread, however much of a stretch\n\
         2. Use words like \"confirmed\", \"allegedly\", \"locked in\"\n\
         3. Under 50 words\n\
         \n\
         Return only the headline, nothing else.",
        target.name,
        if target.interests.is_empty() {
            "none".to_string()
        } else {
            target.interests.join(", ")
        },
        partner.name,
        if partner.interests.is_empty() {
            "none".to_string()
        } else {
            partner.interests.join(", ")
        },
    )
}

fn build_hype_prompt(target: &Actor) -> String {
    format!(
        "You are a hype-machine reporter who blows everything out of \
         proportion. Turn this data point into a sensational headline:\n\
         \n\
         Data: {}'s activity index = off the charts\n\
         \n\
         Rules:\n\
         1. Escalate wildly\n\
         2. Use words like \"shocking\" and \"breaking\"\n\
         3. Under 50 words\n\
         \n\
         Return only the headline, nothing else.",
        target.name,
    )
}

fn build_debate_prompt(topic: &str) -> String {
    format!(
        "Simulate five people with very different temperaments arguing in \
         a chat room. Topic: {topic}\n\
         \n\
         Each character speaks exactly one line (under 30 words), five \
         lines total. Format: [Name]: line\n\
         \n\
         Characters: AcidTongue (cutting), Superfan (blindly supportive), \
         Conspiracist (sees plots everywhere), VoiceOfReason (reasonable, \
         gets dunked on), Bystander (here for the drama)\n\
         \n\
         Make them bicker, one-up each other, and ham it up."
    )
}
