mod attempts;
mod catalog;
mod notes;

pub(super) use attempts::{
    assessment_results, my_assessments, start_assessment, submit_assessment,
};
pub(super) use catalog::{
    add_question, create_assessment, get_assessment, list_assessments, update_assessment,
};
pub(super) use notes::{
    course_notes, create_note, delete_note, download_note, get_note, list_notes, notes_by_course,
    update_note,
};
