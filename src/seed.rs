// Sample boards for trying the tool out

use rusqlite::Connection;
use anyhow::Result;
use crate::models::NewTask;
use crate::repo::{ProjectRepo, StageRepo, TaskRepo};

struct SampleProject {
    title: &'static str,
    description: &'static str,
    /// (title, description, stage name)
    tasks: &'static [(&'static str, &'static str, &'static str)],
}

const SAMPLE_PROJECTS: &[SampleProject] = &[
    SampleProject {
        title: "Website Redesign",
        description: "Complete redesign of company website with modern UI/UX",
        tasks: &[
            ("Research competitor websites", "Analyze 5 top competitor websites", "Done"),
            ("Create wireframes", "Design wireframes for all main pages", "Done"),
            ("Design homepage mockup", "Create high-fidelity mockup for homepage", "In Progress"),
            ("Design about page", "Create about page design", "In Progress"),
            ("Implement responsive navigation", "Code mobile-friendly navigation menu", "In Progress"),
            ("Build contact form", "Create and test contact form functionality", "Not Started"),
            ("Optimize images", "Compress and optimize all images", "Not Started"),
            ("SEO optimization", "Implement SEO best practices", "Not Started"),
            ("Cross-browser testing", "Test on Chrome, Firefox, Safari, Edge", "Not Started"),
            ("Deploy to production", "Deploy website to hosting server", "Not Started"),
        ],
    },
    SampleProject {
        title: "Mobile App Development",
        description: "Develop cross-platform mobile application for iOS and Android",
        tasks: &[
            ("Define app requirements", "Document all functional requirements", "Done"),
            ("Create user flow diagrams", "Map out user journey and flows", "Done"),
            ("Design UI screens", "Create all screen designs in Figma", "Done"),
            ("Set up development environment", "Configure React Native environment", "In Progress"),
            ("Implement authentication", "Build login and registration flow", "In Progress"),
            ("Create home screen", "Develop main dashboard screen", "In Progress"),
            ("Implement push notifications", "Set up Firebase push notifications", "Not Started"),
            ("Add offline support", "Implement offline data caching", "Not Started"),
            ("Performance optimization", "Optimize app performance and load times", "Not Started"),
            ("Submit to app stores", "Submit app to Apple App Store and Google Play", "Not Started"),
            ("Create marketing materials", "Design app screenshots and description", "Not Started"),
        ],
    },
    SampleProject {
        title: "Marketing Campaign Q1",
        description: "Plan and execute Q1 marketing campaign across all channels",
        tasks: &[
            ("Define campaign goals", "Set KPIs and success metrics", "Done"),
            ("Identify target audience", "Create detailed buyer personas", "Done"),
            ("Develop campaign messaging", "Create compelling copy and taglines", "In Progress"),
            ("Design social media graphics", "Create visuals for Facebook, Instagram, LinkedIn", "In Progress"),
            ("Set up email campaigns", "Create email sequences in Mailchimp", "In Progress"),
            ("Launch Google Ads", "Create and launch Google Ads campaign", "Not Started"),
            ("Launch Facebook Ads", "Set up Facebook advertising campaign", "Not Started"),
            ("Create blog content", "Write 5 blog posts for campaign", "Not Started"),
            ("Partner outreach", "Contact potential partnership opportunities", "Not Started"),
            ("Monitor campaign metrics", "Track and report on campaign performance", "Not Started"),
            ("Optimize campaigns", "Adjust campaigns based on performance data", "Not Started"),
            ("Create final report", "Compile results and lessons learned", "Not Started"),
        ],
    },
    SampleProject {
        title: "Office Space Renovation",
        description: "Renovate and modernize office workspace for better productivity",
        tasks: &[
            ("Assess current space", "Document existing office layout and issues", "Done"),
            ("Survey employee needs", "Collect feedback from all team members", "Done"),
            ("Hire interior designer", "Research and select design professional", "Done"),
            ("Create floor plan", "Design new office layout and zones", "In Progress"),
            ("Select furniture", "Choose ergonomic desks and chairs", "In Progress"),
            ("Order equipment", "Purchase all furniture and equipment", "Not Started"),
            ("Schedule contractors", "Book electrician and painter", "Not Started"),
            ("Clear and prepare space", "Pack up and relocate items", "Not Started"),
            ("Execute renovation", "Complete all construction work", "Not Started"),
            ("Install new furniture", "Set up all new office furniture", "Not Started"),
            ("Set up technology", "Install monitors, cables, and equipment", "Not Started"),
        ],
    },
];

/// Counts of what a seed run created
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub projects_created: usize,
    pub projects_skipped: usize,
    pub tasks_created: usize,
}

/// Create the sample projects with default stages and tasks.
/// Projects whose title already exists are skipped.
pub fn seed_sample_data(conn: &Connection) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for sample in SAMPLE_PROJECTS {
        if ProjectRepo::get_by_title(conn, sample.title)?.is_some() {
            log::info!("sample project '{}' already exists, skipping", sample.title);
            summary.projects_skipped += 1;
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        let project = ProjectRepo::create(&tx, sample.title, Some(sample.description))?;
        for name in crate::models::DEFAULT_STAGES {
            StageRepo::create(&tx, project.id, name)?;
        }

        for (title, description, stage_name) in sample.tasks {
            let stage = StageRepo::find_by_name(&tx, project.id, stage_name)?
                .ok_or_else(|| anyhow::anyhow!("Sample stage '{}' missing", stage_name))?;
            let new_task = NewTask::new(project.id, stage.id, title, Some(*description), *stage_name == "Done")
                .map_err(|e| anyhow::anyhow!(e))?;
            TaskRepo::create(&tx, &new_task)?;
            summary.tasks_created += 1;
        }

        tx.commit()?;
        summary.projects_created += 1;
    }

    Ok(summary)
}
