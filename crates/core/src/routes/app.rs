//! The PPM page table

use super::table::{RouteDef, RouteTable};
use crate::error::PatternError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Page views of the PPM client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Dashboard,
    ProjectMember,
    Notifications,
    SignIn,
    Requirements,
    RegisterRequirement,
    Todo,
    Schedules,
    Calendar,
    /// Material schedule detail for one schedule
    ScheduleDetails,
    CreateSchedule,
    AdminEmployee,
    AdminProject,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::ProjectMember => "project-member",
            Self::Notifications => "notifications",
            Self::SignIn => "sign-in",
            Self::Requirements => "requirements",
            Self::RegisterRequirement => "register-requirement",
            Self::Todo => "todo",
            Self::Schedules => "schedules",
            Self::Calendar => "calendar",
            Self::ScheduleDetails => "schedule-details",
            Self::CreateSchedule => "create-schedule",
            Self::AdminEmployee => "admin-employee",
            Self::AdminProject => "admin-project",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route definitions in matching order
pub fn ppm_routes() -> Vec<RouteDef<View>> {
    vec![
        RouteDef::redirect("/", "/", "/todo"),
        RouteDef::view("/dashboard", "대시보드", View::Dashboard),
        RouteDef::view("/project-member", "프로젝트 구성원", View::ProjectMember),
        RouteDef::view("/notifications", "알림", View::Notifications),
        RouteDef::view("/sign-in", "SignIn", View::SignIn),
        RouteDef::view("/requirements", "요구사항", View::Requirements),
        RouteDef::view(
            "/requirements/register",
            "RegisterRequirement",
            View::RegisterRequirement,
        ),
        RouteDef::view("/todo", "Todo", View::Todo),
        RouteDef::view("/schedules", "일정", View::Schedules),
        RouteDef::view("/schedules/calendar", "Calendar", View::Calendar),
        RouteDef::view(
            "/schedules/details/:scheduleId",
            "SchedulesDetails",
            View::ScheduleDetails,
        ),
        RouteDef::view(
            "/schedules/:projectId/create",
            "CreateSchedule",
            View::CreateSchedule,
        ),
        RouteDef::view("/admin", "회원", View::AdminEmployee)
            .with_children(vec![RouteDef::view("employee", "회원", View::AdminEmployee)]),
        RouteDef::view("/admin/project", "프로젝트", View::AdminProject),
    ]
}

/// Compile the PPM route table
pub fn ppm_route_table() -> Result<RouteTable<View>, PatternError> {
    RouteTable::new(ppm_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_url_resolves_to_its_view() {
        let table = ppm_route_table().unwrap();
        let cases = [
            ("/dashboard", View::Dashboard),
            ("/project-member", View::ProjectMember),
            ("/notifications", View::Notifications),
            ("/sign-in", View::SignIn),
            ("/requirements", View::Requirements),
            ("/requirements/register", View::RegisterRequirement),
            ("/todo", View::Todo),
            ("/schedules", View::Schedules),
            ("/schedules/calendar", View::Calendar),
            ("/schedules/details/42", View::ScheduleDetails),
            ("/schedules/9/create", View::CreateSchedule),
            ("/admin", View::AdminEmployee),
            ("/admin/employee", View::AdminEmployee),
            ("/admin/project", View::AdminProject),
        ];

        for (path, view) in cases {
            let matched = table
                .resolve(path)
                .unwrap_or_else(|| panic!("{path} should resolve"));
            assert_eq!(matched.view(), Some(&view), "{path}");
        }
    }

    #[test]
    fn test_root_redirects_to_todo() {
        let table = ppm_route_table().unwrap();
        assert_eq!(table.resolve("/").unwrap().redirect(), Some("/todo"));
    }

    #[test]
    fn test_calendar_is_not_taken_as_project_id() {
        let table = ppm_route_table().unwrap();
        let matched = table.resolve("/schedules/calendar").unwrap();
        assert_eq!(matched.name(), Some("Calendar"));
        assert!(matched.params.is_empty());
    }

    #[test]
    fn test_path_params_are_exposed() {
        let table = ppm_route_table().unwrap();
        let details = table.resolve("/schedules/details/42").unwrap();
        assert_eq!(details.param("scheduleId"), Some("42"));

        let create = table.resolve("/schedules/17/create").unwrap();
        assert_eq!(create.parse_param::<u32>("projectId"), Ok(17));
    }

    #[test]
    fn test_admin_employee_is_nested_under_admin() {
        let table = ppm_route_table().unwrap();
        let matched = table.resolve("/admin/employee").unwrap();
        assert_eq!(matched.matched.len(), 2);
        assert_eq!(matched.matched[0].path, "/admin");
        assert_eq!(matched.matched[1].path, "/admin/employee");
    }

    #[test]
    fn test_duplicate_display_name_reverses_to_first() {
        let table = ppm_route_table().unwrap();
        assert_eq!(table.reverse("회원", &[]).unwrap(), "/admin");
        assert_eq!(
            table
                .reverse("SchedulesDetails", &[("scheduleId", "42")])
                .unwrap(),
            "/schedules/details/42"
        );
    }
}
