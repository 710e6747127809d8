use std::path::Path;

use super::keywords::score_with_keywords;
use super::{Candidate, ConfidenceBase, Validator, find_candidates, score_candidate};
use crate::model::{Match, MatchContext};
use crate::validators::pattern_cache::{CompiledPattern, PatternCache};

struct PlatformPattern {
    platform: &'static str,
    regex: &'static str,
    base_confidence: f64,
}

/// URL-shaped profile references get a higher base confidence than the
/// bare `@handle` form, which is ambiguous without a platform keyword
/// nearby (spec §4.5.4's proximity/cross-reference factors lean on that
/// keyword check instead).
const PLATFORM_PATTERNS: &[PlatformPattern] = &[
    PlatformPattern {
        platform: "github",
        regex: r"github\.com/([A-Za-z0-9][A-Za-z0-9-]{0,37})",
        base_confidence: 55.0,
    },
    PlatformPattern {
        platform: "linkedin",
        regex: r"linkedin\.com/in/([A-Za-z0-9-]{1,100})",
        base_confidence: 55.0,
    },
    PlatformPattern {
        platform: "instagram",
        regex: r"instagram\.com/([A-Za-z0-9_.]{1,30})",
        base_confidence: 50.0,
    },
    PlatformPattern {
        platform: "facebook",
        regex: r"facebook\.com/([A-Za-z0-9.]{3,50})",
        base_confidence: 45.0,
    },
    PlatformPattern {
        platform: "twitter",
        regex: r"@([A-Za-z0-9_]{2,15})\b",
        base_confidence: 30.0,
    },
];

const PLATFORM_KEYWORDS: &[(&str, &str)] = &[
    ("twitter", "twitter"),
    ("twitter", "x.com"),
    ("twitter", "follow me"),
];

/// Detects profile references for each known platform, then reconstructs
/// related findings into a single `SOCIAL_MEDIA_CLUSTER` per spec §4.5.4.
/// New module — the teacher has no social-profile concept; the clustering
/// shape (proximity + similarity factors, union of related matches, a
/// synthetic finding replacing the originals) is grounded on the same
/// "merge correlated signals into one higher-confidence finding" idea as
/// the teacher's multi-pattern `Pattern` matching in `scan/scanner.rs`,
/// generalized to cross-match correlation.
pub struct SocialMediaValidator {
    patterns: Vec<(&'static str, f64, CompiledPattern)>,
}

impl SocialMediaValidator {
    pub fn new() -> Self {
        let patterns = PLATFORM_PATTERNS
            .iter()
            .filter_map(|p| {
                PatternCache::compile_named(p.platform, p.regex, &[], false)
                    .map(|compiled| (p.platform, p.base_confidence, compiled))
            })
            .collect();
        Self { patterns }
    }

    fn detect_individual(&self, content: &str, path: &Path) -> Vec<Match> {
        let mut matches = Vec::new();
        for (platform, _base, pattern) in &self.patterns {
            for candidate in find_candidates(pattern, content) {
                if let Some(username) = capture_username(pattern, &candidate.text) {
                    if let Some(mut m) = score_candidate(self, candidate, path, content) {
                        m.finding_type = "SOCIAL_MEDIA".to_string();
                        m = m
                            .with_metadata("platform", *platform)
                            .with_metadata("username", username);
                        matches.push(m);
                    }
                }
            }
        }
        matches
    }
}

fn capture_username(pattern: &CompiledPattern, text: &str) -> Option<String> {
    pattern
        .regex
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn normalize_username(username: &str) -> String {
    let stripped: String = username
        .chars()
        .filter(|c| *c != '.' && *c != '_' && *c != '-')
        .collect();
    stripped
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_lowercase()
}

fn usernames_similar(a: &str, b: &str) -> bool {
    let (na, nb) = (normalize_username(a), normalize_username(b));
    if na == nb {
        return true;
    }
    if na.len() >= 4 && nb.len() >= 4 {
        return na.contains(&nb) || nb.contains(&na);
    }
    false
}

fn shared_brand_element(a: &str, b: &str) -> bool {
    let na = normalize_username(a);
    let nb = normalize_username(b);
    if na.len() < 3 || nb.len() < 3 {
        return false;
    }
    let (shorter, longer) = if na.len() <= nb.len() { (&na, &nb) } else { (&nb, &na) };
    shorter.chars().any(|c| c.is_ascii_alphabetic()) && longer.contains(shorter.as_str())
}

/// Are two individual matches related (spec §4.5.4's `(a)`–`(d)` tests),
/// combined with the proximity threshold.
fn related(a: &Match, b: &Match) -> bool {
    let line_delta = (a.coordinate.line as i64 - b.coordinate.line as i64).unsigned_abs();
    if line_delta as f64 * 80.0 > 500.0 {
        return false;
    }

    let plat_a = a.metadata_get("platform").unwrap_or_default();
    let plat_b = b.metadata_get("platform").unwrap_or_default();
    let user_a = a.metadata_get("username").unwrap_or_default();
    let user_b = b.metadata_get("username").unwrap_or_default();

    if plat_a != plat_b && normalize_username(user_a) == normalize_username(user_b) {
        return true;
    }
    if usernames_similar(user_a, user_b) {
        return true;
    }
    if a.context.full_line.to_lowercase().contains(&plat_b.to_lowercase())
        || b.context.full_line.to_lowercase().contains(&plat_a.to_lowercase())
    {
        return true;
    }
    shared_brand_element(user_a, user_b)
}

struct ClusterFactors {
    platform_diversity: f64,
    username_similarity: f64,
    proximity: f64,
    cross_ref: f64,
    branding: f64,
}

impl ClusterFactors {
    fn sum(&self) -> f64 {
        self.platform_diversity + self.username_similarity + self.proximity + self.cross_ref + self.branding
    }
}

fn compute_factors(members: &[&Match]) -> ClusterFactors {
    let platforms: std::collections::HashSet<&str> =
        members.iter().filter_map(|m| m.metadata_get("platform")).collect();

    let mut username_similarity = 0.0;
    let mut cross_ref = 0.0;
    let mut branding = 0.0;
    let mut proximity = 0.0;

    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let (a, b) = (members[i], members[j]);
            let user_a = a.metadata_get("username").unwrap_or_default();
            let user_b = b.metadata_get("username").unwrap_or_default();

            if normalize_username(user_a) == normalize_username(user_b) {
                username_similarity = f64::max(username_similarity, 15.0);
            } else if usernames_similar(user_a, user_b) {
                username_similarity = f64::max(username_similarity, 8.0);
            }

            let plat_a = a.metadata_get("platform").unwrap_or_default();
            let plat_b = b.metadata_get("platform").unwrap_or_default();
            if a.context.full_line.to_lowercase().contains(&plat_b.to_lowercase())
                || b.context.full_line.to_lowercase().contains(&plat_a.to_lowercase())
            {
                cross_ref = f64::max(cross_ref, 10.0);
            }

            if shared_brand_element(user_a, user_b) {
                branding = f64::max(branding, 5.0);
            }

            let line_delta = (a.coordinate.line as i64 - b.coordinate.line as i64).unsigned_abs();
            if (line_delta as f64) * 80.0 <= 500.0 {
                proximity = f64::max(proximity, 5.0);
            }
        }
    }

    ClusterFactors {
        platform_diversity: if platforms.len() >= 2 { 10.0 } else { 0.0 },
        username_similarity,
        proximity,
        cross_ref,
        branding,
    }
}

fn choose_cluster_type(members: &[&Match], factors: &ClusterFactors) -> (&'static str, f64) {
    let platforms: std::collections::HashSet<&str> =
        members.iter().filter_map(|m| m.metadata_get("platform")).collect();
    let identical_username = factors.username_similarity >= 15.0;

    if identical_username && platforms.len() >= 2 {
        ("same_user_multi_platform", 25.0)
    } else if platforms.len() == 1 {
        ("fragmented_references", 10.0)
    } else if platforms.len() >= 2 && factors.username_similarity > 0.0 {
        ("multi_platform_presence", 20.0)
    } else {
        ("related_profiles", 15.0)
    }
}

/// Union-find over the individual matches using the `related` predicate,
/// then a reconstruction pass per cluster.
fn cluster(matches: Vec<Match>) -> Vec<Match> {
    let n = matches.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if related(&matches[i], &matches[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri] = rj;
                }
            }
        }
    }

    let mut groups: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }

    let mut output = Vec::new();
    for indices in groups.values() {
        if indices.len() < 2 {
            output.push(matches[indices[0]].clone());
            continue;
        }

        let members: Vec<&Match> = indices.iter().map(|&i| &matches[i]).collect();
        let factors = compute_factors(&members);
        let factor_sum = factors.sum();
        let clustering_confidence = factor_sum.min(100.0);

        if factor_sum < 20.0 || clustering_confidence < 30.0 {
            for &i in indices {
                output.push(matches[i].clone());
            }
            continue;
        }

        let (cluster_type, type_boost) = choose_cluster_type(&members, &factors);
        let max_individual = members.iter().map(|m| m.confidence).fold(0.0_f64, f64::max);
        let confidence = (max_individual + 0.3 * clustering_confidence + type_boost).min(95.0);

        let best = members
            .iter()
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
            .unwrap();

        let mut platforms: Vec<&str> = members.iter().filter_map(|m| m.metadata_get("platform")).collect();
        platforms.sort_unstable();
        platforms.dedup();
        let mut usernames: Vec<&str> = members.iter().filter_map(|m| m.metadata_get("username")).collect();
        usernames.sort_unstable();
        usernames.dedup();

        let mut parts = Vec::new();
        for platform in &platforms {
            let users: Vec<&str> = members
                .iter()
                .filter(|m| m.metadata_get("platform") == Some(platform))
                .filter_map(|m| m.metadata_get("username"))
                .collect();
            parts.push(format!("{platform}: {}", users.join(", ")));
        }

        let mut cluster_match = Match {
            finding_type: "SOCIAL_MEDIA_CLUSTER".to_string(),
            validator_id: "SOCIAL_MEDIA",
            matched_text: parts.join(" | "),
            coordinate: best.coordinate.clone(),
            confidence,
            file_path: best.file_path.clone(),
            context: best.context.clone(),
            metadata: vec![
                ("platforms".to_string(), platforms.join(",")),
                ("usernames".to_string(), usernames.join(",")),
                ("cluster_type".to_string(), cluster_type.to_string()),
                ("clustering_confidence".to_string(), format!("{clustering_confidence:.1}")),
            ],
            cluster_members: indices
                .iter()
                .map(|&i| std::sync::Arc::new(matches[i].clone()))
                .collect(),
        };
        cluster_match.metadata.push((
            "original_matches".to_string(),
            members
                .iter()
                .map(|m| format!("{}@{:.0}", m.matched_text, m.confidence))
                .collect::<Vec<_>>()
                .join(";"),
        ));
        output.push(cluster_match);
    }

    output
}

impl Validator for SocialMediaValidator {
    fn id(&self) -> &'static str {
        "SOCIAL_MEDIA"
    }

    fn validate_content(&self, content: &str, path: &Path) -> Vec<Match> {
        let individual = self.detect_individual(content, path);
        cluster(individual)
    }

    fn calculate_confidence(&self, candidate: &Candidate) -> ConfidenceBase {
        for (platform, base, pattern) in &self.patterns {
            if pattern.regex.is_match(&candidate.text) {
                return ConfidenceBase {
                    base: *base,
                    failed_checks: Vec::new(),
                    finding_type: Some("SOCIAL_MEDIA".to_string()),
                    extra_metadata: vec![("platform".to_string(), platform.to_string())],
                };
            }
        }
        ConfidenceBase {
            base: 0.0,
            failed_checks: vec!["no_platform_match"],
            finding_type: Some("SOCIAL_MEDIA".to_string()),
            extra_metadata: Vec::new(),
        }
    }

    fn analyze_context(&self, candidate: &Candidate, context: &MatchContext) -> f64 {
        let mut delta = score_with_keywords(context, &[], &[]);
        let line_lower = context.full_line.to_lowercase();
        for (_, keyword) in PLATFORM_KEYWORDS {
            if candidate.text.starts_with('@') && line_lower.contains(keyword) {
                delta += 18.0;
            }
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clusters_same_user_across_platforms() {
        let validator = SocialMediaValidator::new();
        let content = "Follow me @johndoe on Twitter\ngithub.com/johndoe\nlinkedin.com/in/johndoe\n";
        let matches = validator.validate_content(content, &std::path::PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].finding_type, "SOCIAL_MEDIA_CLUSTER");
        assert!(matches[0].confidence > 70.0);
        let platforms = matches[0].metadata_get("platforms").unwrap();
        assert!(platforms.contains("twitter"));
        assert!(platforms.contains("github"));
        assert!(platforms.contains("linkedin"));
    }

    #[test]
    fn unrelated_single_mention_stays_individual() {
        let validator = SocialMediaValidator::new();
        let matches = validator.validate_content("see github.com/torvalds for the kernel", &std::path::PathBuf::from("a.txt"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].finding_type, "SOCIAL_MEDIA");
    }
}
