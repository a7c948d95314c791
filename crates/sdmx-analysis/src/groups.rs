use sdmx_model::{AgencyGroup, CodeListRecord, normalize_component};

/// Group code lists by owning organization.
///
/// Only organizations owning more than one list get a group. Organizations
/// are ordered by their first appearance in `source_order`, falling back to
/// `lists` order for any organization missing there. List ids inside each
/// group keep `lists` order.
pub fn agency_groups<'a>(
    source_order: impl IntoIterator<Item = &'a str>,
    lists: &[CodeListRecord],
) -> Vec<AgencyGroup> {
    let mut groups: Vec<(String, AgencyGroup)> = Vec::new();
    for organization in source_order {
        slot(&mut groups, organization);
    }
    for list in lists {
        let position = slot(&mut groups, &list.owning_organization);
        let members = &mut groups[position].1.member_list_ids;
        if !members.contains(&list.list_id) {
            members.push(list.list_id.clone());
        }
    }
    groups
        .into_iter()
        .map(|(_, group)| group)
        .filter(|group| group.member_list_ids.len() > 1)
        .collect()
}

fn slot(groups: &mut Vec<(String, AgencyGroup)>, organization: &str) -> usize {
    let org_key = normalize_component(organization);
    if let Some(position) = groups.iter().position(|(key, _)| *key == org_key) {
        return position;
    }
    groups.push((
        org_key,
        AgencyGroup {
            owning_organization: organization.to_string(),
            member_list_ids: Vec::new(),
        },
    ));
    groups.len() - 1
}
