use sentry_api_client::{
    Organization,
    Project,
    SentryApi,
    Team,
};
use tokio::sync::mpsc;

/// Id and slug of an organization, team or project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: u64,
    pub slug: String,
}

impl From<&Organization> for Entity {
    fn from(organization: &Organization) -> Self {
        Self {
            id: organization.id,
            slug: organization.slug.clone(),
        }
    }
}

impl From<&Team> for Entity {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            slug: team.slug.clone(),
        }
    }
}

impl From<&Project> for Entity {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            slug: project.slug.clone(),
        }
    }
}

/// Stats of one project, fetched by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub organization: Entity,
    pub team: Entity,
    pub project: Entity,
}

impl FetchJob {
    /// One job per (team, project) pair of an organization detail.
    pub fn expand(organization: &Organization) -> impl Iterator<Item = FetchJob> + '_ {
        let org = Entity::from(organization);
        organization.teams.iter().flat_map(move |team| {
            let org = org.clone();
            team.projects.iter().map(move |project| FetchJob {
                organization: org.clone(),
                team: Entity::from(team),
                project: Entity::from(project),
            })
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Pagination ran to the last page without a listing error.
    pub completed: bool,
    pub pages: usize,
    pub organizations: usize,
    pub jobs: usize,
}

/// Walks organizations page by page and queues a [`FetchJob`] per project.
pub struct HierarchyWalker<'a> {
    api: &'a dyn SentryApi,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(api: &'a dyn SentryApi) -> Self {
        Self { api }
    }

    /// Enqueues the jobs of every page before requesting the next one.
    ///
    /// A failing organization detail only skips that organization, a failing
    /// listing request ends the walk with `completed == false`.
    pub async fn walk(&self, jobs: &mpsc::Sender<FetchJob>) -> WalkSummary {
        let mut summary = WalkSummary::default();

        let mut page = match self.api.list_organizations().await {
            Ok(page) => page,
            Err(err) => {
                error!("failed listing organizations: {err}");
                return summary;
            }
        };

        loop {
            summary.pages += 1;
            if page.items.is_empty() {
                break;
            }

            for listed in &page.items {
                // the listing omits teams and projects
                let organization = match self.api.organization(&listed.slug).await {
                    Ok(organization) => organization,
                    Err(err) => {
                        error!("failed pulling organization details for {}: {err}", listed.slug);
                        continue;
                    }
                };
                summary.organizations += 1;

                for job in FetchJob::expand(&organization) {
                    if jobs.send(job).await.is_err() {
                        error!("stat workers are gone, aborting organization walk");
                        return summary;
                    }
                    summary.jobs += 1;
                }
            }

            if !page.link.has_next() {
                break;
            }
            page = match self.api.next_page(&page.link).await {
                Ok(next) => next,
                Err(err) => {
                    error!("failed paginating organizations: {err}");
                    return summary;
                }
            };
            debug!(page = summary.pages + 1, organizations = page.items.len(), "fetched organizations page");
        }

        summary.completed = true;
        summary
    }
}
