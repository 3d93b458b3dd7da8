use uuid::Uuid;

use crate::database::models::{
    AdAccount, Campaign, EntityType, NewNotification, NotificationKind, TeamMember, User,
};

pub fn campaign_created(user_id: Uuid, campaign: &Campaign) -> NewNotification {
    NewNotification {
        user_id,
        title: "Campaign Created".to_string(),
        message: format!("Campaign \"{}\" has been created successfully", campaign.name),
        kind: NotificationKind::Success,
        related_entity_type: Some(EntityType::Campaign),
        related_entity_id: Some(campaign.id),
    }
}

pub fn account_connected(user_id: Uuid, account: &AdAccount) -> NewNotification {
    NewNotification {
        user_id,
        title: "Account Connected".to_string(),
        message: format!("{} account connected successfully", account.platform.title()),
        kind: NotificationKind::Success,
        related_entity_type: Some(EntityType::Account),
        related_entity_id: Some(account.id),
    }
}

pub fn invitation_sent(owner_id: Uuid, member: &TeamMember) -> NewNotification {
    NewNotification {
        user_id: owner_id,
        title: "Team Invitation Sent".to_string(),
        message: format!("Invitation sent to {}", member.email),
        kind: NotificationKind::Info,
        related_entity_type: Some(EntityType::Team),
        related_entity_id: Some(member.id),
    }
}

/// Sent to the team owner when an invitee joins.
pub fn invitation_accepted(member: &TeamMember, invitee: &User) -> NewNotification {
    let who = match invitee.display_name() {
        name if name.is_empty() => member.email.clone(),
        name => name,
    };
    NewNotification {
        user_id: member.team_owner_id,
        title: "Invitation Accepted".to_string(),
        message: format!("{} joined your team as {}", who, member.role),
        kind: NotificationKind::Success,
        related_entity_type: Some(EntityType::Team),
        related_entity_id: Some(member.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{MemberStatus, Role, SubscriptionPlan};
    use chrono::Utc;

    fn member() -> TeamMember {
        TeamMember {
            id: Uuid::new_v4(),
            user_id: None,
            team_owner_id: Uuid::new_v4(),
            email: "grace@example.com".into(),
            role: Role::Analyst,
            permissions: None,
            status: MemberStatus::Pending,
            invited_at: Utc::now(),
            joined_at: None,
        }
    }

    #[test]
    fn invitation_sent_targets_owner() {
        let m = member();
        let n = invitation_sent(m.team_owner_id, &m);
        assert_eq!(n.title, "Team Invitation Sent");
        assert_eq!(n.message, "Invitation sent to grace@example.com");
        assert_eq!(n.kind, NotificationKind::Info);
        assert_eq!(n.related_entity_id, Some(m.id));
    }

    #[test]
    fn invitation_accepted_falls_back_to_email() {
        let m = member();
        let now = Utc::now();
        let invitee = User {
            id: Uuid::new_v4(),
            email: Some(m.email.clone()),
            first_name: None,
            last_name: None,
            profile_image_url: None,
            company: None,
            subscription_plan: SubscriptionPlan::Starter,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        let n = invitation_accepted(&m, &invitee);
        assert_eq!(n.user_id, m.team_owner_id);
        assert_eq!(n.message, "grace@example.com joined your team as analyst");
    }
}
