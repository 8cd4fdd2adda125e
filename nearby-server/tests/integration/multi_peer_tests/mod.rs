mod test_participant_leaves_others_stay;
